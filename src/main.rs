use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use montbell_image_rust::{cli, config, error, export, input, logging, net, pipeline};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use pipeline::{BatchRunner, PipelineOptions, ProgressEvent};
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("❌ 実行エラー: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Batches { input, batch_size } => {
            let table = input::read_spreadsheet(&input)?;
            let size = batch_size.unwrap_or(config.batch_size);
            println!("📂 {} ({}件)", input.display(), table.len());
            if let Some(header) = table.model_header() {
                println!("  型番列: {}", header);
            }
            for batch in table.batches(size) {
                println!("  📦 {}", batch.label());
            }
        }

        Commands::Run { input, batch, output, domain, delay, batch_size, report_json } => {
            println!("🏔️ montbell-dl - 画像一括ダウンロード\n");

            let mut config = config;
            if let Some(domain) = domain {
                config.domain = Config::validate_domain(&domain)?;
            }
            if let Some(delay) = delay {
                config.delay_seconds = Config::validate_delay(delay)?;
            }
            let size = batch_size.unwrap_or(config.batch_size);

            // 1. Excel読み込み
            println!("[1/3] 型番リストを読み込み中...");
            let table = input::read_spreadsheet(&input)?;
            let (batch, rows) = table.batch(batch as usize - 1, size)?;
            println!("✔ {} ({}件)\n", batch.label(), batch.len());

            // 2. ダウンロード
            println!("[2/3] 画像をダウンロード中...");
            let fetcher = net::HttpFetcher::new(Duration::from_secs(config.page_timeout_seconds))?;
            let mut runner = BatchRunner::new(fetcher, PipelineOptions::from_config(&config))?;

            let bar = ProgressBar::new(rows.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let result = runner
                .run(rows, batch.number(), &mut |event| match event {
                    ProgressEvent::RowStarted { model_id, .. } => {
                        bar.set_message(format!("処理中: {}", model_id));
                    }
                    ProgressEvent::RowSkipped { .. } => bar.inc(1),
                    ProgressEvent::RowFinished { log_line, .. } => {
                        bar.set_message(log_line.to_string());
                        bar.inc(1);
                    }
                    ProgressEvent::ReportWritten { name } => {
                        bar.set_message(format!("📊 {}", name));
                    }
                })
                .await;
            bar.finish_and_clear();

            // 直近の結果
            for line in runner.log().lines() {
                println!("  {}", line);
            }
            let result = result?;
            println!("✔ バッチ処理完了\n");

            // 3. 保存
            println!("[3/3] ZIPを保存中...");
            let output = output.unwrap_or_else(|| PathBuf::from("."));
            let path = export::save_archive(&result, &output)?;
            println!("✔ ZIP出力: {}", path.display());

            if let Some(json_path) = report_json {
                export::write_report_json(&result, &json_path)?;
                println!("✔ JSON出力: {}", json_path.display());
            }

            println!("\n🎉 {}枚の画像をパッケージしました", result.total_images);
        }

        Commands::Config { set_domain, set_delay, show } => {
            let mut config = config;

            if let Some(domain) = set_domain {
                config.set_domain(&domain)?;
                println!("✔ ドメインを設定しました: {}", config.domain);
            }

            if let Some(delay) = set_delay {
                config.set_delay(delay)?;
                println!("✔ 待機秒数を設定しました: {}秒", config.delay_seconds);
            }

            if show {
                println!("設定:");
                println!("  ドメイン: {}", config.domain);
                println!("  待機: {}秒 (画像 {}ms)", config.delay_seconds, config.image_delay_ms);
                println!("  画像タイムアウト: {}秒", config.image_timeout_seconds);
                println!("  バッチサイズ: {}", config.batch_size);
                println!("  型番あたりのページ数: {}", config.max_pages_per_model);
                println!("  HEAD確認: {}", if config.head_check { "有効" } else { "無効" });
                if let Ok(path) = Config::config_path() {
                    println!("  設定ファイル: {}", path.display());
                }
            }
        }
    }

    Ok(())
}
