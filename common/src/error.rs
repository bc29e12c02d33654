//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Selector error: {0}")]
    Selector(String),

    #[error("Report error: {0}")]
    Report(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_from_url() {
        let url_error = url::Url::parse("not a url").unwrap_err();
        let error: Error = url_error.into();
        assert!(matches!(error, Error::Url(_)));
        assert!(format!("{}", error).contains("URL error"));
    }

    #[test]
    fn test_error_display_selector() {
        let error = Error::Selector("不正なセレクタ".to_string());
        assert_eq!(format!("{}", error), "Selector error: 不正なセレクタ");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Report("テスト".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Report"));
        assert!(debug.contains("テスト"));
    }
}
