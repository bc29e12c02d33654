//! レポート出力のコア（CLIからZIPに格納される）

#[cfg(feature = "excel")]
pub mod excel_core;
