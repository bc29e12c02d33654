//! ダウンロード概要のExcel生成
//!
//! 型番ごとの画像数・カラー・ステータスを1シートにまとめ、バッファで返す。

use crate::error::{Error, Result};
use crate::types::ReportRow;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

pub const REPORT_SHEET_NAME: &str = "ダウンロード概要";

pub const REPORT_HEADERS: [&str; 5] = ["型番", "画像数", "取得カラー", "ステータス", "備考"];

const COLUMN_WIDTHS: [f64; 5] = [16.0, 10.0, 28.0, 12.0, 28.0];

/// レポートのファイル名（バッチ番号は1始まり）
pub fn report_file_name(batch_number: usize) -> String {
    format!("report_batch_{}.xlsx", batch_number)
}

/// レポートExcelをバッファに生成
pub fn generate_report_buffer(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let cell_format = Format::new()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let failed_format = cell_format.clone().set_font_color(Color::RGB(0xC00000));

    {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(REPORT_SHEET_NAME)
            .map_err(|e| Error::Report(format!("シート名設定エラー: {}", e)))?;

        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width)
                .map_err(|e| Error::Report(format!("列幅設定エラー: {}", e)))?;
        }

        for (col, header) in REPORT_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(|e| Error::Report(format!("ヘッダー書き込みエラー: {}", e)))?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            let status_format = if row.image_count > 0 { &cell_format } else { &failed_format };

            worksheet
                .write_string_with_format(r, 0, &row.model_id, &cell_format)
                .and_then(|ws| ws.write_number_with_format(r, 1, row.image_count as f64, &cell_format))
                .and_then(|ws| ws.write_string_with_format(r, 2, row.colors_joined(), &cell_format))
                .and_then(|ws| ws.write_string_with_format(r, 3, row.status.label(), status_format))
                .and_then(|ws| ws.write_string_with_format(r, 4, row.note(), &cell_format))
                .map_err(|e| Error::Report(format!("行書き込みエラー ({}): {}", row.model_id, e)))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| Error::Report(format!("Excel保存エラー: {}", e)))
}
