//! リクエストヘッダ生成
//!
//! ブラウザ（iPhone Safari）からのアクセスに見せるための固定ヘッダ。

use std::collections::BTreeMap;

pub const DEFAULT_REFERER: &str = "https://webshop.montbell.jp/";

pub const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";

/// ヘッダ一式を返す（Refererは未指定ならサイトルート）
pub fn build_headers(referer: Option<&str>) -> BTreeMap<&'static str, String> {
    let referer = referer
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REFERER);

    let mut headers = BTreeMap::new();
    headers.insert("User-Agent", USER_AGENT.to_string());
    headers.insert("Accept", ACCEPT.to_string());
    headers.insert("Accept-Language", ACCEPT_LANGUAGE.to_string());
    headers.insert("Referer", referer.to_string());
    headers.insert("Connection", "keep-alive".to_string());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_referer() {
        let headers = build_headers(None);
        assert_eq!(headers["Referer"], DEFAULT_REFERER);
        assert_eq!(headers["Connection"], "keep-alive");
        assert!(headers["User-Agent"].contains("Safari"));
        assert_eq!(headers.len(), 5);
    }

    #[test]
    fn test_explicit_referer() {
        let headers = build_headers(Some("https://webshop.montbell.jp/goods/detail.php?k=1"));
        assert_eq!(headers["Referer"], "https://webshop.montbell.jp/goods/detail.php?k=1");
    }

    #[test]
    fn test_blank_referer_falls_back() {
        assert_eq!(build_headers(Some("  "))["Referer"], DEFAULT_REFERER);
    }
}
