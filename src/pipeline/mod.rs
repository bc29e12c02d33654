//! バッチ処理本体
//!
//! 行ごとに: 商品ページ解決 → 画像URL抽出 → ダウンロード → ZIP格納 → 集計行。
//! 1件の失敗はその行の「失敗」として記録するだけで、次の行へ進む。
//! ZIP/レポートの生成に失敗した場合のみバッチ全体を失敗にする。

pub mod archive;

use crate::config::Config;
use crate::error::Result;
use crate::export::excel::add_report_to_archive;
use crate::net::{FetchResponse, Fetcher};
use crate::resolver::{self, ResolverOptions};
use archive::ArchiveBuilder;
use montbell_image_common::{
    extract_color, file_name_from_url, DownloadedAsset, FailureKind, ImageCandidate,
    ImageLocator, InputRow, LocatorConfig, ReportRow,
};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const LOG_CAPACITY: usize = 3;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub domain: String,
    /// 検索・商品ページ取得前の待機
    pub page_delay: Duration,
    /// 画像取得前の待機
    pub image_delay: Duration,
    pub page_timeout: Option<Duration>,
    pub image_timeout: Duration,
    pub max_product_urls: usize,
    pub max_pages_per_model: usize,
    pub head_check: bool,
    pub locator: LocatorConfig,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domain: config.domain.clone(),
            page_delay: config.page_delay(),
            image_delay: config.image_delay(),
            page_timeout: Some(Duration::from_secs(config.page_timeout_seconds)),
            image_timeout: Duration::from_secs(config.image_timeout_seconds),
            max_product_urls: config.max_product_urls.max(1),
            max_pages_per_model: config.max_pages_per_model.max(1),
            head_check: config.head_check,
            locator: LocatorConfig {
                scan_all_images: config.scan_all_images,
                ..Default::default()
            },
        }
    }

    fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            domain: self.domain.clone(),
            delay: self.page_delay,
            max_urls: self.max_product_urls,
            timeout: self.page_timeout,
        }
    }
}

/// 実行状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Done,
    Failed(String),
}

/// 進捗通知
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    RowStarted { position: usize, total: usize, model_id: &'a str },
    RowSkipped { position: usize, total: usize },
    RowFinished { position: usize, total: usize, row: &'a ReportRow, log_line: &'a str },
    ReportWritten { name: &'a str },
}

/// 直近の処理結果（表示用）
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    lines: VecDeque<String>,
}

impl RunLog {
    pub fn push(&mut self, line: String) {
        if self.lines.len() == LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// 1行分の結果ログ
pub fn outcome_line(row: &ReportRow) -> String {
    if row.image_count > 0 {
        format!("✅ {}: {}枚 ({})", row.model_id, row.image_count, row.colors_joined())
    } else {
        format!("⚠️ {}: 画像なし", row.model_id)
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    /// ZIPのバイト列（型番フォルダ + レポート）
    pub archive: Vec<u8>,
    pub report_rows: Vec<ReportRow>,
    pub total_images: usize,
    /// 1始まり
    pub batch_number: usize,
    pub report_name: Option<String>,
}

/// 1回の実行で使う可変状態
#[derive(Default)]
struct RunState {
    archive: ArchiveBuilder,
    report_rows: Vec<ReportRow>,
    total_images: usize,
    log: RunLog,
    report_name: Option<String>,
}

impl RunState {
    fn finish(self, batch_number: usize) -> Result<(BatchResult, RunLog)> {
        let archive = self.archive.finish()?;
        let result = BatchResult {
            archive,
            report_rows: self.report_rows,
            total_images: self.total_images,
            batch_number,
            report_name: self.report_name,
        };
        Ok((result, self.log))
    }
}

pub struct BatchRunner<F: Fetcher> {
    fetcher: F,
    options: PipelineOptions,
    locator: ImageLocator,
    phase: RunPhase,
    log: RunLog,
}

impl<F: Fetcher> BatchRunner<F> {
    pub fn new(fetcher: F, options: PipelineOptions) -> Result<Self> {
        let locator = ImageLocator::with_config(options.locator.clone())?;
        Ok(Self {
            fetcher,
            options,
            locator,
            phase: RunPhase::Idle,
            log: RunLog::default(),
        })
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn reset(&mut self) {
        self.phase = RunPhase::Idle;
        self.log.clear();
    }

    /// バッチを実行（batch_number は1始まり、レポート名に使用）
    pub async fn run(
        &mut self,
        rows: &[InputRow],
        batch_number: usize,
        observer: &mut dyn FnMut(ProgressEvent<'_>),
    ) -> Result<BatchResult> {
        self.phase = RunPhase::Running;
        self.log.clear();

        let mut state = RunState::default();
        let executed = self.execute(&mut state, rows, batch_number, observer).await;
        let outcome = match executed {
            Ok(()) => state.finish(batch_number),
            Err(e) => {
                self.log = std::mem::take(&mut state.log);
                Err(e)
            }
        };

        match outcome {
            Ok((result, log)) => {
                self.log = log;
                self.phase = RunPhase::Done;
                info!(
                    "バッチ{}完了: {}件 / {}枚",
                    batch_number,
                    result.report_rows.len(),
                    result.total_images
                );
                Ok(result)
            }
            Err(e) => {
                error!("バッチ{}失敗: {}", batch_number, e);
                self.phase = RunPhase::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        state: &mut RunState,
        rows: &[InputRow],
        batch_number: usize,
        observer: &mut dyn FnMut(ProgressEvent<'_>),
    ) -> Result<()> {
        let total = rows.len();

        for (i, row) in rows.iter().enumerate() {
            let position = i + 1;
            if row.is_skippable() {
                debug!("{}行目: 型番なしのためスキップ", position);
                observer(ProgressEvent::RowSkipped { position, total });
                continue;
            }

            let model_id = row.model_id.trim();
            observer(ProgressEvent::RowStarted { position, total, model_id });

            let report = self.process_row(state, model_id, row.direct_url.as_deref()).await?;
            state.total_images += report.image_count;

            let line = outcome_line(&report);
            if report.image_count > 0 {
                info!("{}", line);
            } else {
                warn!("{} ({})", line, report.note());
            }
            observer(ProgressEvent::RowFinished { position, total, row: &report, log_line: &line });
            state.log.push(line);
            state.report_rows.push(report);
        }

        if !state.report_rows.is_empty() {
            let name = add_report_to_archive(&mut state.archive, &state.report_rows, batch_number)?;
            observer(ProgressEvent::ReportWritten { name: &name });
            state.log.push(format!("📊 レポートを生成しました: {}", name));
            state.report_name = Some(name);
        }

        Ok(())
    }

    /// 1型番分。Err はZIP書き込みの失敗のみ
    async fn process_row(
        &self,
        state: &mut RunState,
        model_id: &str,
        direct_url: Option<&str>,
    ) -> Result<ReportRow> {
        let resolved = resolver::resolve(
            &self.fetcher,
            model_id,
            direct_url,
            &self.options.resolver_options(),
        )
        .await;

        let Some(referer) = resolved.page_urls.first().cloned() else {
            return Ok(ReportRow::failed(model_id, FailureKind::Resolution));
        };

        let (candidates, fetched_pages) = self.collect_candidates(model_id, &resolved.page_urls).await;
        if fetched_pages == 0 {
            return Ok(ReportRow::failed(model_id, FailureKind::Fetch));
        }
        if candidates.is_empty() {
            return Ok(ReportRow::failed(model_id, FailureKind::Extraction));
        }
        debug!("{}: 画像候補 {}件", model_id, candidates.len());

        let mut image_count = 0;
        let mut colors = BTreeSet::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let Some(response) = self.fetch_image(&candidate.url, &referer).await else {
                continue;
            };

            let file_name = file_name_from_url(
                &candidate.url,
                model_id,
                index,
                response.content_type.as_deref(),
            );
            let asset = DownloadedAsset {
                model_id: model_id.to_string(),
                archive_path: state.archive.unique_path(model_id, &file_name, index),
                color_code: extract_color(&file_name),
                bytes: response.body,
            };
            state.archive.add_asset(&asset)?;

            image_count += 1;
            if let Some(color) = asset.color_code {
                colors.insert(color);
            }
        }

        let mut report = ReportRow::new(model_id, image_count, colors);
        if image_count == 0 {
            report.failure = Some(FailureKind::Download);
        }
        Ok(report)
    }

    /// 先頭から max_pages_per_model 件のページを取得して候補をまとめる
    async fn collect_candidates(&self, model_id: &str, page_urls: &[String]) -> (Vec<ImageCandidate>, usize) {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut fetched_pages = 0;

        for url in page_urls.iter().take(self.options.max_pages_per_model) {
            sleep(self.options.page_delay).await;

            let response = match self.fetcher.get(url, None, self.options.page_timeout).await {
                Ok(r) if r.is_success() => r,
                Ok(r) => {
                    warn!("{}: 商品ページ HTTP {} ({})", model_id, r.status, url);
                    continue;
                }
                Err(e) => {
                    warn!("{}: 商品ページ取得失敗 ({}): {}", model_id, url, e);
                    continue;
                }
            };
            fetched_pages += 1;

            let base = if response.final_url.is_empty() { url.as_str() } else { response.final_url.as_str() };
            for candidate in self.locator.locate(&response.text(), base) {
                if seen.insert(candidate.url.clone()) {
                    candidates.push(candidate);
                }
            }
        }

        (candidates, fetched_pages)
    }

    /// 成功かつ image/* のレスポンスだけ返す
    async fn fetch_image(&self, url: &str, referer: &str) -> Option<FetchResponse> {
        sleep(self.options.image_delay).await;
        let timeout = Some(self.options.image_timeout);

        if self.options.head_check {
            match self.fetcher.head(url, Some(referer), timeout).await {
                Ok(r) if r.is_success() && r.is_image() => {}
                Ok(r) => {
                    debug!("HEADで除外: {} (HTTP {})", url, r.status);
                    return None;
                }
                Err(e) => {
                    debug!("HEAD失敗: {}: {}", url, e);
                    return None;
                }
            }
        }

        match self.fetcher.get(url, Some(referer), timeout).await {
            Ok(r) if r.is_success() && r.is_image() => Some(r),
            Ok(r) => {
                debug!("画像ではないため除外: {} (HTTP {}, {:?})", url, r.status, r.content_type);
                None
            }
            Err(e) => {
                debug!("画像取得失敗: {}: {}", url, e);
                None
            }
        }
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
