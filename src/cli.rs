use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{MAX_DELAY_SECONDS, MIN_DELAY_SECONDS};

#[derive(Parser)]
#[command(name = "montbell-dl")]
#[command(about = "Montbell商品画像一括ダウンロード・レポート生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Excelのバッチ一覧を表示
    Batches {
        /// 型番リストのExcelファイル
        #[arg(required = true)]
        input: PathBuf,

        /// バッチサイズ（省略時は設定値）
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// 1バッチ分の画像をダウンロードしてZIPを生成
    Run {
        /// 型番リストのExcelファイル
        #[arg(required = true)]
        input: PathBuf,

        /// バッチ番号（1始まり）
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        batch: u64,

        /// 出力ZIPファイル/ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 対象ドメイン（省略時は設定値）
        #[arg(long)]
        domain: Option<String>,

        /// リクエスト間の待機秒数
        #[arg(long, value_parser = clap::value_parser!(u64).range(MIN_DELAY_SECONDS..=MAX_DELAY_SECONDS))]
        delay: Option<u64>,

        /// バッチサイズ（省略時は設定値）
        #[arg(long)]
        batch_size: Option<usize>,

        /// 集計結果をJSONでも保存
        #[arg(long)]
        report_json: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 対象ドメインを設定
        #[arg(long)]
        set_domain: Option<String>,

        /// 待機秒数を設定
        #[arg(long)]
        set_delay: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
