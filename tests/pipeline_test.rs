//! バッチ処理の結合テスト
//!
//! ネットワークの代わりにメモリ上の Fetcher を使う

use async_trait::async_trait;
use montbell_image_common::{FailureKind, InputRow, RowStatus};
use montbell_image_rust::error::{AppError, Result};
use montbell_image_rust::net::{FetchResponse, Fetcher};
use montbell_image_rust::pipeline::{BatchRunner, PipelineOptions, ProgressEvent, RunPhase};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Mutex;
use std::time::Duration;
use zip::ZipArchive;

const DOMAIN: &str = "https://webshop.montbell.jp";

#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, FetchResponse>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                final_url: url.to_string(),
                status: 200,
                content_type: Some("text/html; charset=UTF-8".into()),
                body: html.as_bytes().to_vec(),
            },
        );
        self
    }

    fn image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                final_url: url.to_string(),
                status: 200,
                content_type: Some("image/jpeg".into()),
                body: bytes.to_vec(),
            },
        );
        self
    }

    fn status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                final_url: url.to_string(),
                status,
                content_type: Some("text/html".into()),
                body: Vec::new(),
            },
        );
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str, _referer: Option<&str>, _timeout: Option<Duration>) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.responses.get(url).cloned().unwrap_or(FetchResponse {
            final_url: url.to_string(),
            status: 404,
            content_type: Some("text/html".into()),
            body: Vec::new(),
        }))
    }

    async fn head(&self, url: &str, referer: Option<&str>, timeout: Option<Duration>) -> Result<FetchResponse> {
        let mut response = self.get(url, referer, timeout).await?;
        response.body.clear();
        Ok(response)
    }
}

fn options() -> PipelineOptions {
    PipelineOptions {
        domain: DOMAIN.to_string(),
        page_delay: Duration::ZERO,
        image_delay: Duration::ZERO,
        page_timeout: None,
        image_timeout: Duration::from_secs(1),
        max_product_urls: 5,
        max_pages_per_model: 1,
        head_check: false,
        locator: Default::default(),
    }
}

fn search(model_id: &str) -> String {
    format!("{}/goods/list_search.php?top_sk={}", DOMAIN, model_id)
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let mut zip = ZipArchive::new(Cursor::new(archive.to_vec())).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

fn standard_fetcher() -> FakeFetcher {
    FakeFetcher::default()
        .page(
            &search("1234567"),
            r#"<ul><li><a href="/goods/detail.php?k=1234567">商品</a></li></ul>"#,
        )
        .page(
            &format!("{}/goods/detail.php?k=1234567", DOMAIN),
            r#"<div class="cutImglArea"><img src="/common/images/product/cut_c/cc_1234567_NV.jpg"></div>"#,
        )
        .image(
            &format!("{}/common/images/product/cut_c/cc_1234567_NV.jpg", DOMAIN),
            b"jpeg-nv",
        )
}

async fn run(fetcher: FakeFetcher, rows: &[InputRow]) -> (BatchRunner<FakeFetcher>, Result<montbell_image_rust::pipeline::BatchResult>) {
    let mut runner = BatchRunner::new(fetcher, options()).unwrap();
    let result = runner.run(rows, 1, &mut |_| {}).await;
    (runner, result)
}

#[tokio::test]
async fn test_search_to_archive() {
    let (runner, result) = run(standard_fetcher(), &[InputRow::new("1234567")]).await;
    let result = result.unwrap();

    assert_eq!(runner.phase(), &RunPhase::Done);
    assert_eq!(result.total_images, 1);
    assert_eq!(result.report_name.as_deref(), Some("report_batch_1.xlsx"));

    let row = &result.report_rows[0];
    assert_eq!(row.status, RowStatus::Success);
    assert_eq!(row.colors_joined(), "NV");

    let names = entry_names(&result.archive);
    assert!(names.contains(&"1234567/cc_1234567_NV.jpg".to_string()));
    assert!(names.contains(&"report_batch_1.xlsx".to_string()));

    // 高解像度版も試している（404なので格納されない）
    let calls = runner.fetcher().calls();
    assert_eq!(calls[0], format!("{}/goods/list_search.php?top_sk=1234567", DOMAIN));
    assert_eq!(calls[1], format!("{}/goods/detail.php?k=1234567", DOMAIN));
    assert!(calls.iter().any(|u| u.ends_with("/cut_k/ck_1234567_NV.jpg")));
    assert_eq!(names.len(), 2);

    let mut zip = ZipArchive::new(Cursor::new(result.archive.clone())).unwrap();
    let mut content = Vec::new();
    zip.by_name("1234567/cc_1234567_NV.jpg").unwrap().read_to_end(&mut content).unwrap();
    assert_eq!(content, b"jpeg-nv");
}

#[tokio::test]
async fn test_skipped_rows_make_no_requests() {
    let rows = [InputRow::new(""), InputRow::new("nan")];
    let (runner, result) = run(FakeFetcher::default(), &rows).await;
    let result = result.unwrap();

    assert!(result.report_rows.is_empty());
    assert!(result.report_name.is_none());
    assert!(runner.fetcher().calls().is_empty());
    assert!(entry_names(&result.archive).is_empty());
}

#[tokio::test]
async fn test_page_error_continues_batch() {
    let fetcher = standard_fetcher()
        .page(
            &search("7654321"),
            r#"<a href="/goods/disp.php?product_id=7654321">x</a>"#,
        )
        .status(&format!("{}/goods/disp.php?product_id=7654321", DOMAIN), 500);

    let rows = [InputRow::new("7654321"), InputRow::new("1234567")];
    let (runner, result) = run(fetcher, &rows).await;
    let result = result.unwrap();

    assert_eq!(runner.phase(), &RunPhase::Done);
    assert_eq!(result.report_rows.len(), 2);
    assert_eq!(result.report_rows[0].status, RowStatus::Failed);
    assert_eq!(result.report_rows[0].failure, Some(FailureKind::Fetch));
    assert_eq!(result.report_rows[1].status, RowStatus::Success);
    assert_eq!(result.total_images, 1);
}

#[tokio::test]
async fn test_unresolved_model() {
    let fetcher = FakeFetcher::default().page(&search("0000000"), "<p>該当なし</p>");
    let (_, result) = run(fetcher, &[InputRow::new("0000000")]).await;
    let result = result.unwrap();

    let row = &result.report_rows[0];
    assert_eq!(row.failure, Some(FailureKind::Resolution));
    assert_eq!(row.colors_joined(), "なし/未識別");
    // 失敗行だけでもレポートは作る
    assert_eq!(entry_names(&result.archive), vec!["report_batch_1.xlsx".to_string()]);
}

#[tokio::test]
async fn test_direct_url_skips_search() {
    let page = format!("{}/goods/detail.php?k=1234567", DOMAIN);
    let rows = [InputRow::with_url("1234567", page.clone())];
    let (runner, result) = run(standard_fetcher(), &rows).await;

    assert_eq!(result.unwrap().total_images, 1);
    let calls = runner.fetcher().calls();
    assert!(!calls.iter().any(|u| u.contains("list_search.php")));
    assert_eq!(calls[0], page);
}

#[tokio::test]
async fn test_same_basename_gets_distinct_paths() {
    let page = format!("{}/goods/disp.php?product_id=1111111", DOMAIN);
    let fetcher = FakeFetcher::default()
        .page(
            &page,
            r#"<div class="cutImglArea">
                <img src="/a/cut_c/cc_1111111_BK.jpg">
                <img src="/b/cut_c/cc_1111111_BK.jpg">
            </div>"#,
        )
        .image(&format!("{}/a/cut_c/cc_1111111_BK.jpg", DOMAIN), b"a")
        .image(&format!("{}/b/cut_c/cc_1111111_BK.jpg", DOMAIN), b"b");

    let (_, result) = run(fetcher, &[InputRow::with_url("1111111", page)]).await;
    let result = result.unwrap();

    let images: Vec<String> = entry_names(&result.archive)
        .into_iter()
        .filter(|n| n.starts_with("1111111/"))
        .collect();
    assert_eq!(images.len(), 2);
    assert_ne!(images[0], images[1]);
    assert_eq!(result.report_rows[0].image_count, 2);
    assert_eq!(result.report_rows[0].colors_joined(), "BK");
}

#[tokio::test]
async fn test_total_matches_rows_and_progress() {
    let fetcher = standard_fetcher().page(
        &format!("{}/goods/disp.php?product_id=2222222", DOMAIN),
        r#"<a class="fancy_largelink" href="/img/k_2222222_RD.jpg"><img src="/img/c_2222222_RD.jpg"></a>"#,
    )
    .image(&format!("{}/img/k_2222222_RD.jpg", DOMAIN), b"k")
    .image(&format!("{}/img/c_2222222_RD.jpg", DOMAIN), b"c");

    let rows = [
        InputRow::new("1234567"),
        InputRow::new(""),
        InputRow::with_url("2222222", format!("{}/goods/disp.php?product_id=2222222", DOMAIN)),
    ];

    let mut runner = BatchRunner::new(fetcher, options()).unwrap();
    let mut finished = Vec::new();
    let mut skipped = 0;
    let result = runner
        .run(&rows, 3, &mut |event| match event {
            ProgressEvent::RowFinished { log_line, .. } => finished.push(log_line.to_string()),
            ProgressEvent::RowSkipped { .. } => skipped += 1,
            _ => {}
        })
        .await
        .unwrap();

    let sum: usize = result.report_rows.iter().map(|r| r.image_count).sum();
    assert_eq!(result.total_images, sum);
    assert_eq!(result.total_images, 3);
    assert_eq!(skipped, 1);
    assert_eq!(finished, vec!["✅ 1234567: 1枚 (NV)", "✅ 2222222: 2枚 (RD)"]);
    assert_eq!(result.report_name.as_deref(), Some("report_batch_3.xlsx"));

    // 直近3行（2行分の結果 + レポート）
    assert_eq!(runner.log().lines().count(), 3);

    runner.reset();
    assert_eq!(runner.phase(), &RunPhase::Idle);
    assert_eq!(runner.log().lines().count(), 0);
}

#[tokio::test]
async fn test_head_check_filters_non_images() {
    let mut opts = options();
    opts.head_check = true;
    let mut runner = BatchRunner::new(standard_fetcher(), opts).unwrap();
    let result = runner.run(&[InputRow::new("1234567")], 1, &mut |_| {}).await.unwrap();

    assert_eq!(result.total_images, 1);
    // HEAD + GET、404 の高解像度版は HEAD のみ
    let calls = runner.fetcher().calls();
    let count = |suffix: &str| calls.iter().filter(|u| u.ends_with(suffix)).count();
    assert_eq!(count("cc_1234567_NV.jpg"), 2);
    assert_eq!(count("ck_1234567_NV.jpg"), 1);
}

#[tokio::test]
async fn test_fetcher_error_is_not_fatal() {
    struct Failing;

    #[async_trait]
    impl Fetcher for Failing {
        async fn get(&self, _: &str, _: Option<&str>, _: Option<Duration>) -> Result<FetchResponse> {
            Err(AppError::Config("network down".into()))
        }
        async fn head(&self, _: &str, _: Option<&str>, _: Option<Duration>) -> Result<FetchResponse> {
            Err(AppError::Config("network down".into()))
        }
    }

    let mut runner = BatchRunner::new(Failing, options()).unwrap();
    let result = runner.run(&[InputRow::new("1234567")], 1, &mut |_| {}).await.unwrap();
    assert_eq!(result.report_rows[0].failure, Some(FailureKind::Resolution));
    assert_eq!(runner.phase(), &RunPhase::Done);
}

#[tokio::test]
async fn test_report_failure_fails_run() {
    // Excelのセル上限（32767文字）を超える型番ではレポートを書けない
    let long_id = "9".repeat(40_000);
    let mut runner = BatchRunner::new(FakeFetcher::default(), options()).unwrap();
    let mut finished = 0;
    let result = runner
        .run(&[InputRow::new(long_id)], 1, &mut |event| {
            if let ProgressEvent::RowFinished { .. } = event {
                finished += 1;
            }
        })
        .await;

    assert_eq!(finished, 1);
    assert!(matches!(result, Err(AppError::Report(_))));
    assert!(matches!(runner.phase(), RunPhase::Failed(message) if message.contains("レポート")));
    // 失敗までの結果ログは残る
    assert_eq!(runner.log().lines().count(), 1);

    runner.reset();
    assert_eq!(runner.phase(), &RunPhase::Idle);
}
