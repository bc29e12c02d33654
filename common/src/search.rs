//! 検索結果ページから商品詳細ページのリンクを集める

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// 商品詳細ページのパス
pub const PRODUCT_PATH_PATTERNS: &[&str] = &["goods/detail.php", "goods/disp.php"];

pub fn is_product_url(url: &str) -> bool {
    PRODUCT_PATH_PATTERNS.iter().any(|p| url.contains(p))
}

/// 検索結果から商品ページURLを抽出（出現順・重複なし・最大 `limit` 件）
///
/// リンクが無く、リダイレクト後のURL自体が商品ページならそれを返す。
pub fn extract_product_links(markup: &str, final_url: &str, limit: usize) -> Vec<String> {
    let base = match Url::parse(final_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    {
        let document = Html::parse_document(markup);
        let anchor = match Selector::parse("a[href]") {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        let mut seen = HashSet::new();
        for a in document.select(&anchor) {
            let Some(href) = a.value().attr("href") else {
                continue;
            };
            if !is_product_url(href) {
                continue;
            }
            if let Ok(resolved) = base.join(href.trim()) {
                let resolved = resolved.to_string();
                if seen.insert(resolved.clone()) {
                    links.push(resolved);
                }
            }
        }
    }

    if links.is_empty() && is_product_url(final_url) {
        links.push(final_url.to_string());
    }

    links.truncate(limit);
    links
}
