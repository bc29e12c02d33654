//! ダウンロード概要Excel（ZIPのルートに格納）

use crate::error::{AppError, Result};
use crate::pipeline::archive::ArchiveBuilder;
use montbell_image_common::export::excel_core::{generate_report_buffer, report_file_name};
use montbell_image_common::ReportRow;

/// レポートを生成してZIPに追加し、ファイル名を返す
pub fn add_report_to_archive(
    archive: &mut ArchiveBuilder,
    rows: &[ReportRow],
    batch_number: usize,
) -> Result<String> {
    let buffer = generate_report_buffer(rows).map_err(|e| AppError::Report(e.to_string()))?;
    let name = report_file_name(batch_number);
    archive.add_file(&name, &buffer)?;
    Ok(name)
}
