use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("Excel読み込みエラー: {0}")]
    Spreadsheet(String),

    #[error("バッチ番号が範囲外です: {index} (全{total}バッチ)")]
    BatchOutOfRange { index: usize, total: usize },

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ZIP生成エラー: {0}")]
    Archive(String),

    #[error("レポート生成エラー: {0}")]
    Report(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] montbell_image_common::Error),
}

impl From<zip::result::ZipError> for AppError {
    fn from(e: zip::result::ZipError) -> Self {
        AppError::Archive(e.to_string())
    }
}

impl From<calamine::Error> for AppError {
    fn from(e: calamine::Error) -> Self {
        AppError::Spreadsheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
