//! HTTP取得
//!
//! パイプラインは `Fetcher` トレイト越しにアクセスする（テストではメモリ上の実装に差し替え）。

use crate::error::{AppError, Result};
use async_trait::async_trait;
use montbell_image_common::build_headers;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::time::Duration;

/// レスポンス（ステータスが失敗でもエラーにはしない）
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// リダイレクト後のURL
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, referer: Option<&str>, timeout: Option<Duration>) -> Result<FetchResponse>;

    async fn head(&self, url: &str, referer: Option<&str>, timeout: Option<Duration>) -> Result<FetchResponse>;
}

/// reqwest による実装
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(default_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(default_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    fn headers(referer: Option<&str>) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in build_headers(referer) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::Config(format!("不正なヘッダー名 {}: {}", name, e)))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| AppError::Config(format!("不正なヘッダー値 {}: {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        referer: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<FetchResponse> {
        let is_head = method == Method::HEAD;
        let mut request = self.client.request(method, url).headers(Self::headers(referer)?);
        if let Some(t) = timeout {
            request = request.timeout(t);
        }

        let response = request.send().await?;
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = if is_head {
            Vec::new()
        } else {
            response.bytes().await?.to_vec()
        };

        tracing::debug!("{} {} ({} bytes)", status, final_url, body.len());
        Ok(FetchResponse { final_url, status, content_type, body })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, referer: Option<&str>, timeout: Option<Duration>) -> Result<FetchResponse> {
        self.send(Method::GET, url, referer, timeout).await
    }

    async fn head(&self, url: &str, referer: Option<&str>, timeout: Option<Duration>) -> Result<FetchResponse> {
        self.send(Method::HEAD, url, referer, timeout).await
    }
}
