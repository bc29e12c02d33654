pub mod excel;

use crate::error::Result;
use crate::pipeline::BatchResult;
use montbell_image_common::ReportRow;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn archive_file_name(batch_number: usize) -> String {
    format!("montbell_batch_{}_report.zip", batch_number)
}

/// ディレクトリ（または拡張子なし）ならその中に既定名で、そうでなければそのパスに保存
pub fn archive_output_path(output: &Path, batch_number: usize) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(archive_file_name(batch_number))
    } else {
        output.to_path_buf()
    }
}

pub fn save_archive(result: &BatchResult, output: &Path) -> Result<PathBuf> {
    let path = archive_output_path(output, result.batch_number);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&path, &result.archive)?;
    Ok(path)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    batch_number: usize,
    total_images: usize,
    rows: &'a [ReportRow],
}

pub fn write_report_json(result: &BatchResult, path: &Path) -> Result<()> {
    let report = JsonReport {
        batch_number: result.batch_number,
        total_images: result.total_images,
        rows: &result.report_rows,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_output_path() {
        let dir = std::env::temp_dir();
        assert_eq!(
            archive_output_path(&dir, 2),
            dir.join("montbell_batch_2_report.zip")
        );
        assert_eq!(
            archive_output_path(Path::new("out/custom.zip"), 2),
            PathBuf::from("out/custom.zip")
        );
    }
}
