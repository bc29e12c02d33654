//! 型番から商品ページURLを決める
//!
//! URL列に絶対URLがあればそれを使い、無ければサイト内検索の結果から拾う。
//! 失敗しても空のリストを返すだけでバッチは止めない。

use crate::net::Fetcher;
use montbell_image_common::{extract_product_links, ResolvedProduct};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const SEARCH_PATH: &str = "/goods/list_search.php";

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub domain: String,
    /// 検索リクエスト前の待機
    pub delay: Duration,
    pub max_urls: usize,
    pub timeout: Option<Duration>,
}

/// `{domain}/goods/list_search.php?top_sk={model_id}`
pub fn search_url(domain: &str, model_id: &str) -> Option<String> {
    let endpoint = format!("{}{}", domain.trim().trim_end_matches('/'), SEARCH_PATH);
    Url::parse_with_params(&endpoint, &[("top_sk", model_id)])
        .ok()
        .map(|u| u.to_string())
}

/// http(s) の絶対URLなら返す
pub fn direct_product_url(direct_url: Option<&str>) -> Option<String> {
    let raw = direct_url?.trim();
    match Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Some(raw.to_string()),
        _ => None,
    }
}

pub async fn resolve<F: Fetcher + ?Sized>(
    fetcher: &F,
    model_id: &str,
    direct_url: Option<&str>,
    options: &ResolverOptions,
) -> ResolvedProduct {
    if let Some(url) = direct_product_url(direct_url) {
        debug!("{}: 指定URLを使用 {}", model_id, url);
        return ResolvedProduct {
            model_id: model_id.to_string(),
            page_urls: vec![url],
        };
    }

    let page_urls = search(fetcher, model_id, options).await;
    if page_urls.is_empty() {
        warn!("{}: 商品ページが見つかりません", model_id);
    }

    ResolvedProduct {
        model_id: model_id.to_string(),
        page_urls,
    }
}

async fn search<F: Fetcher + ?Sized>(fetcher: &F, model_id: &str, options: &ResolverOptions) -> Vec<String> {
    let Some(url) = search_url(&options.domain, model_id) else {
        warn!("{}: 検索URLを組み立てられません (domain={})", model_id, options.domain);
        return Vec::new();
    };

    if !options.delay.is_zero() {
        tokio::time::sleep(options.delay).await;
    }

    let response = match fetcher.get(&url, None, options.timeout).await {
        Ok(r) => r,
        Err(e) => {
            warn!("{}: 検索リクエスト失敗: {}", model_id, e);
            return Vec::new();
        }
    };

    if !response.is_success() {
        warn!("{}: 検索結果 HTTP {}", model_id, response.status);
        return Vec::new();
    }

    let links = extract_product_links(&response.text(), &response.final_url, options.max_urls);
    debug!("{}: 商品ページ {}件", model_id, links.len());
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        assert_eq!(
            search_url("https://webshop.montbell.jp/", "1234567").as_deref(),
            Some("https://webshop.montbell.jp/goods/list_search.php?top_sk=1234567")
        );
        assert_eq!(
            search_url("https://webshop.montbell.jp", "a b&c").as_deref(),
            Some("https://webshop.montbell.jp/goods/list_search.php?top_sk=a+b%26c")
        );
        assert_eq!(search_url("not a domain", "1"), None);
    }

    #[test]
    fn test_direct_product_url() {
        assert_eq!(
            direct_product_url(Some(" https://webshop.montbell.jp/goods/disp.php?product_id=1 ")).as_deref(),
            Some("https://webshop.montbell.jp/goods/disp.php?product_id=1")
        );
        assert_eq!(direct_product_url(Some("goods/disp.php")), None);
        assert_eq!(direct_product_url(Some("")), None);
        assert_eq!(direct_product_url(None), None);
    }
}
