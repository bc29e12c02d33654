//! 商品ページから画像URLを抽出する
//!
//! 2つの抽出方式を併用する:
//! - Markup: 拡大リンク・プリロード領域・メイン画像・サムネイル列の `<img>`
//! - Script: インラインスクリプト内の `cimages[...]` / `kimages[...]` 連想配列
//!
//! どちらも見つからなければ空を返すだけで、エラーにはしない。

use crate::error::{Error, Result};
use crate::types::ImageCandidate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// 低解像度→高解像度の置換ペア
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// ディレクトリ部分（例: `/cut_c/` → `/cut_k/`）
    pub low_dir: String,
    pub high_dir: String,
    /// ファイル名の接頭辞（例: `cc_` → `ck_`）
    pub low_prefix: String,
    pub high_prefix: String,
}

impl Substitution {
    pub fn new(low_dir: &str, high_dir: &str, low_prefix: &str, high_prefix: &str) -> Self {
        Self {
            low_dir: low_dir.to_string(),
            high_dir: high_dir.to_string(),
            low_prefix: low_prefix.to_string(),
            high_prefix: high_prefix.to_string(),
        }
    }

    /// 置換後のURLを返す（存在確認はしない）
    pub fn apply(&self, url: &str) -> Option<String> {
        if !url.contains(&self.low_dir) {
            return None;
        }
        let replaced = url.replacen(&self.low_dir, &self.high_dir, 1);

        let (head, file) = match replaced.rfind('/') {
            Some(pos) => replaced.split_at(pos + 1),
            None => ("", replaced.as_str()),
        };
        let file = match file.strip_prefix(self.low_prefix.as_str()) {
            Some(rest) => format!("{}{}", self.high_prefix, rest),
            None => file.to_string(),
        };
        Some(format!("{}{}", head, file))
    }
}

/// 抽出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Markup,
    Script,
}

/// 抽出設定
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// 拡大画像リンク（href と内側の img src の両方）
    pub large_link: String,
    /// プリロード用の隠し領域
    pub hidden: String,
    /// メイン画像
    pub main_image: String,
    /// サムネイル列
    pub thumbnails: String,
    pub substitutions: Vec<Substitution>,
    /// スクリプトにパスが無い場合のディレクトリ
    pub default_compressed_dir: String,
    pub default_high_res_dir: String,
    /// すべての `<img>` も候補にする
    pub scan_all_images: bool,
    /// 適用する方式（順序どおりに和集合を取る）
    pub strategies: Vec<Strategy>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            large_link: "a.fancy_largelink".to_string(),
            hidden: "#img_hidden_pre img, #img_hidden_later img".to_string(),
            main_image: "#largelinkImg".to_string(),
            thumbnails: ".cutImglArea img".to_string(),
            substitutions: vec![
                Substitution::new("/cut_c/", "/cut_k/", "cc_", "ck_"),
                Substitution::new("/prod_c/", "/prod_k/", "c_", "k_"),
            ],
            default_compressed_dir: "/common/images/product/prod_c".to_string(),
            default_high_res_dir: "/common/images/product/prod_k".to_string(),
            scan_all_images: false,
            strategies: vec![Strategy::Markup, Strategy::Script],
        }
    }
}

struct CompiledSelectors {
    large_link: Selector,
    hidden: Selector,
    main_image: Selector,
    thumbnails: Selector,
    img: Selector,
    script: Selector,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Selector(format!("{}: {}", css, e)))
}

lazy_static::lazy_static! {
    static ref CIMAGE_RE: Regex =
        Regex::new(r#"cimages\[\s*['"]([^'"]+)['"]\s*\]\s*=\s*['"]([^'"]+)['"]"#).unwrap();
    static ref KIMAGE_RE: Regex =
        Regex::new(r#"kimages\[\s*['"]([^'"]+)['"]\s*\]\s*=\s*['"]([^'"]+)['"]"#).unwrap();
    static ref CPATH_RE: Regex =
        Regex::new(r#"cimage_paths\[\s*['"]([^'"]+)['"]\s*\]\s*=\s*['"]([^'"]+)['"]"#).unwrap();
    static ref KPATH_RE: Regex =
        Regex::new(r#"kimage_paths\[\s*['"]([^'"]+)['"]\s*\]\s*=\s*['"]([^'"]+)['"]"#).unwrap();
}

/// 画像URL抽出器
pub struct ImageLocator {
    config: LocatorConfig,
    selectors: CompiledSelectors,
}

impl ImageLocator {
    pub fn new() -> Result<Self> {
        Self::with_config(LocatorConfig::default())
    }

    pub fn with_config(config: LocatorConfig) -> Result<Self> {
        let selectors = CompiledSelectors {
            large_link: parse_selector(&config.large_link)?,
            hidden: parse_selector(&config.hidden)?,
            main_image: parse_selector(&config.main_image)?,
            thumbnails: parse_selector(&config.thumbnails)?,
            img: parse_selector("img")?,
            script: parse_selector("script")?,
        };
        Ok(Self { config, selectors })
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// ページHTMLから候補URLを抽出（URL単位で重複排除、出現順）
    pub fn locate(&self, page_markup: &str, page_url: &str) -> Vec<ImageCandidate> {
        let base = match Url::parse(page_url) {
            Ok(u) => u,
            Err(_) => return Vec::new(),
        };
        let document = Html::parse_document(page_markup);

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for strategy in &self.config.strategies {
            let found = match strategy {
                Strategy::Markup => self.from_markup(&document, &base),
                Strategy::Script => self.from_scripts(&document, &base),
            };
            for candidate in found {
                if seen.insert(candidate.url.clone()) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }

    fn from_markup(&self, document: &Html, base: &Url) -> Vec<ImageCandidate> {
        let s = &self.selectors;
        let mut urls: Vec<String> = Vec::new();

        for link in document.select(&s.large_link) {
            if let Some(href) = link.value().attr("href") {
                urls.extend(resolve(base, href));
            }
            if let Some(img) = link.select(&s.img).next() {
                urls.extend(img_src(base, img));
            }
        }

        for img in document.select(&s.hidden) {
            urls.extend(img_src(base, img));
        }

        if let Some(main) = document.select(&s.main_image).next() {
            urls.extend(img_src(base, main));
        }

        for img in document.select(&s.thumbnails) {
            if let Some(full) = img_src(base, img) {
                let variants: Vec<String> = self
                    .config
                    .substitutions
                    .iter()
                    .filter_map(|sub| sub.apply(&full))
                    .collect();
                urls.push(full);
                urls.extend(variants);
            }
        }

        if self.config.scan_all_images {
            for img in document.select(&s.img) {
                urls.extend(img_src(base, img));
            }
        }

        urls.into_iter()
            .filter(|u| is_fetchable(u))
            .map(ImageCandidate::markup)
            .collect()
    }

    fn from_scripts(&self, document: &Html, base: &Url) -> Vec<ImageCandidate> {
        // variant key → (圧縮画像ファイル名, 高解像度ファイル名)
        let mut files: BTreeMap<String, (Option<String>, Option<String>)> = BTreeMap::new();
        let mut compressed_dirs: BTreeMap<String, String> = BTreeMap::new();
        let mut high_res_dirs: BTreeMap<String, String> = BTreeMap::new();

        for script in document.select(&self.selectors.script) {
            let body: String = script.text().collect();
            if !body.contains("cimages") && !body.contains("kimages") {
                continue;
            }

            for line in body.lines() {
                for caps in CIMAGE_RE.captures_iter(line) {
                    files.entry(caps[1].to_string()).or_default().0 = Some(caps[2].to_string());
                }
                for caps in KIMAGE_RE.captures_iter(line) {
                    files.entry(caps[1].to_string()).or_default().1 = Some(caps[2].to_string());
                }
                for caps in CPATH_RE.captures_iter(line) {
                    compressed_dirs.insert(caps[1].to_string(), caps[2].to_string());
                }
                for caps in KPATH_RE.captures_iter(line) {
                    high_res_dirs.insert(caps[1].to_string(), caps[2].to_string());
                }
            }
        }

        let mut candidates = Vec::new();
        for (key, (compressed, high_res)) in &files {
            if let Some(file) = compressed {
                let dir = compressed_dirs
                    .get(key)
                    .map(String::as_str)
                    .unwrap_or(self.config.default_compressed_dir.as_str());
                candidates.extend(join_path(base, dir, file).map(ImageCandidate::script));
            }
            if let Some(file) = high_res {
                let dir = high_res_dirs
                    .get(key)
                    .map(String::as_str)
                    .unwrap_or(self.config.default_high_res_dir.as_str());
                candidates.extend(join_path(base, dir, file).map(ImageCandidate::script));
            }
        }
        candidates
    }
}

/// デフォルト設定で抽出する
pub fn locate_images(page_markup: &str, page_url: &str) -> Vec<ImageCandidate> {
    match ImageLocator::new() {
        Ok(locator) => locator.locate(page_markup, page_url),
        Err(_) => Vec::new(),
    }
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

fn img_src(base: &Url, img: ElementRef<'_>) -> Option<String> {
    img.value().attr("src").and_then(|src| resolve(base, src))
}

fn join_path(base: &Url, dir: &str, file: &str) -> Option<String> {
    let candidate = format!("{}/{}", dir.trim_end_matches('/'), file.trim_start_matches('/'));
    resolve(base, &candidate).filter(|u| is_fetchable(u))
}

fn is_fetchable(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}
