//! Montbell Image Common Library
//!
//! ネットワークに依存しない抽出ロジックと型（CLIから使用）

pub mod types;
pub mod error;
pub mod headers;
pub mod locator;
pub mod color;
pub mod naming;
pub mod search;
pub mod export;

pub use types::{
    DownloadedAsset, FailureKind, ImageCandidate, InputRow, ReportRow, ResolvedProduct,
    RowStatus, SourceStrategy,
};
pub use error::{Error, Result};
pub use headers::build_headers;
pub use locator::{locate_images, ImageLocator, LocatorConfig, Strategy, Substitution};
pub use color::extract_color;
pub use naming::file_name_from_url;
pub use search::extract_product_links;
