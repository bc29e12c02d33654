use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DOMAIN: &str = "https://webshop.montbell.jp";
pub const MIN_DELAY_SECONDS: u64 = 1;
pub const MAX_DELAY_SECONDS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub domain: String,
    pub delay_seconds: u64,
    pub image_delay_ms: u64,
    pub image_timeout_seconds: u64,
    pub page_timeout_seconds: u64,
    pub batch_size: usize,
    pub max_product_urls: usize,
    pub max_pages_per_model: usize,
    pub head_check: bool,
    pub scan_all_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.into(),
            delay_seconds: 2,
            image_delay_ms: 500,
            image_timeout_seconds: 10,
            page_timeout_seconds: 30,
            batch_size: 50,
            max_product_urls: 5,
            max_pages_per_model: 1,
            head_check: false,
            scan_all_images: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("montbell-image").join("config.json"))
    }

    /// http(s) の絶対URLのみ受け付ける（末尾の `/` は除去）
    pub fn validate_domain(domain: &str) -> Result<String> {
        let trimmed = domain.trim().trim_end_matches('/');
        match url::Url::parse(trimmed) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => {
                Ok(trimmed.to_string())
            }
            _ => Err(AppError::Config(format!("不正なドメイン: {}", domain))),
        }
    }

    pub fn validate_delay(seconds: u64) -> Result<u64> {
        if (MIN_DELAY_SECONDS..=MAX_DELAY_SECONDS).contains(&seconds) {
            Ok(seconds)
        } else {
            Err(AppError::Config(format!(
                "遅延は{}〜{}秒で指定してください: {}",
                MIN_DELAY_SECONDS, MAX_DELAY_SECONDS, seconds
            )))
        }
    }

    pub fn set_domain(&mut self, domain: &str) -> Result<()> {
        self.domain = Self::validate_domain(domain)?;
        self.save()
    }

    pub fn set_delay(&mut self, seconds: u64) -> Result<()> {
        self.delay_seconds = Self::validate_delay(seconds)?;
        self.save()
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    pub fn image_delay(&self) -> Duration {
        Duration::from_millis(self.image_delay_ms)
    }
}
