//! バッチ処理で受け渡しされる型の定義
//!
//! 流れ: InputRow → ResolvedProduct → ImageCandidate → DownloadedAsset → ReportRow

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Excelの1行（型番 + 任意の商品URL）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRow {
    pub model_id: String,

    #[serde(default)]
    pub direct_url: Option<String>,
}

impl InputRow {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            direct_url: None,
        }
    }

    pub fn with_url(model_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            direct_url: Some(url.into()),
        }
    }

    /// 空欄や "nan" の行は処理対象外
    pub fn is_skippable(&self) -> bool {
        let id = self.model_id.trim();
        id.is_empty() || id.eq_ignore_ascii_case("nan")
    }
}

/// 型番から解決された商品ページURL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedProduct {
    pub model_id: String,
    pub page_urls: Vec<String>,
}

/// 画像URLの抽出元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStrategy {
    /// HTML要素から
    Markup,
    /// インラインスクリプトの連想配列から
    Script,
}

/// ダウンロード候補の画像URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageCandidate {
    pub url: String,
    pub source_strategy: SourceStrategy,
}

impl ImageCandidate {
    pub fn markup(url: impl Into<String>) -> Self {
        Self { url: url.into(), source_strategy: SourceStrategy::Markup }
    }

    pub fn script(url: impl Into<String>) -> Self {
        Self { url: url.into(), source_strategy: SourceStrategy::Script }
    }
}

/// ZIPに格納済みの画像
#[derive(Debug, Clone)]
pub struct DownloadedAsset {
    pub model_id: String,
    /// ZIP内で一意なパス（例: `1234567/cc_1234567_NV.jpg`）
    pub archive_path: String,
    pub bytes: Vec<u8>,
    pub color_code: Option<String>,
}

/// 処理結果のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Success,
    Failed,
}

impl RowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RowStatus::Success => "成功",
            RowStatus::Failed => "失敗",
        }
    }
}

/// 失敗の分類（レポートの備考欄）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// 商品ページが見つからない
    Resolution,
    /// 商品ページの取得に失敗
    Fetch,
    /// ページは取得できたが画像が見つからない
    Extraction,
    /// 候補はあったが1枚もダウンロードできない
    Download,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Resolution => "商品ページが見つかりません",
            FailureKind::Fetch => "ページ取得エラー",
            FailureKind::Extraction => "画像が見つかりません",
            FailureKind::Download => "画像ダウンロード失敗",
        }
    }
}

/// 型番ごとの集計行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub model_id: String,
    pub image_count: usize,
    pub colors: BTreeSet<String>,
    pub status: RowStatus,
    #[serde(default)]
    pub failure: Option<FailureKind>,
}

pub const NO_COLOR_LABEL: &str = "なし/未識別";

impl ReportRow {
    /// status は image_count から決まる
    pub fn new(model_id: impl Into<String>, image_count: usize, colors: BTreeSet<String>) -> Self {
        let status = if image_count > 0 { RowStatus::Success } else { RowStatus::Failed };
        Self {
            model_id: model_id.into(),
            image_count,
            colors,
            status,
            failure: None,
        }
    }

    pub fn failed(model_id: impl Into<String>, failure: FailureKind) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(model_id, 0, BTreeSet::new())
        }
    }

    /// カラーをソート済みのカンマ区切りで返す
    pub fn colors_joined(&self) -> String {
        if self.colors.is_empty() {
            NO_COLOR_LABEL.to_string()
        } else {
            self.colors.iter().cloned().collect::<Vec<_>>().join(",")
        }
    }

    pub fn note(&self) -> &'static str {
        self.failure.map(|f| f.label()).unwrap_or("")
    }
}
