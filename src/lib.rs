//! Montbell商品画像 一括ダウンロードツール
//!
//! Excelの型番リスト → 商品ページ → 画像 → ZIP（型番フォルダ + 概要レポート）

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod logging;
pub mod net;
pub mod pipeline;
pub mod resolver;
