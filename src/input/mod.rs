//! 型番リスト（Excel）の読み込みとバッチ分割

use crate::error::{AppError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use montbell_image_common::InputRow;
use std::path::Path;

const MODEL_KEYWORDS: &[&str] = &["型號", "型番", "model", "id"];
const URL_KEYWORDS: &[&str] = &["網址", "url", "link", "リンク"];

/// 型番列とURL列の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub model: usize,
    pub url: Option<usize>,
}

/// バッチ範囲（`start..end`、index は0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Batch {
    /// 表示用の番号（1始まり）
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn label(&self) -> String {
        format!("第{}バッチ (型番 {} - {})", self.number(), self.start + 1, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub rows: Vec<InputRow>,
}

impl InputTable {
    /// ヘッダー行とデータ行から組み立てる
    pub fn from_rows(headers: Vec<String>, data: Vec<Vec<String>>) -> Self {
        let columns = detect_columns(&headers);
        let rows = data.iter().map(|cells| row_from_cells(cells, &columns)).collect();
        Self { headers, columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn model_header(&self) -> Option<&str> {
        self.headers.get(self.columns.model).map(String::as_str)
    }

    pub fn batches(&self, batch_size: usize) -> Vec<Batch> {
        let size = batch_size.max(1);
        let total = self.rows.len();
        (0..total.div_ceil(size))
            .map(|index| Batch {
                index,
                start: index * size,
                end: std::cmp::min((index + 1) * size, total),
            })
            .collect()
    }

    /// 指定バッチ（0始まり）の範囲と行
    pub fn batch(&self, index: usize, batch_size: usize) -> Result<(Batch, &[InputRow])> {
        let batches = self.batches(batch_size);
        let batch = *batches.get(index).ok_or(AppError::BatchOutOfRange {
            index: index + 1,
            total: batches.len(),
        })?;
        Ok((batch, &self.rows[batch.start..batch.end]))
    }
}

/// 先頭シートを読み込む（1行目はヘッダー）
pub fn read_spreadsheet(path: &Path) -> Result<InputTable> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Spreadsheet(format!("シートがありません: {}", path.display())))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_to_string).collect())
        .unwrap_or_default();
    let data: Vec<Vec<String>> = rows
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();

    Ok(InputTable::from_rows(headers, data))
}

/// 列名のキーワードで型番列・URL列を決める（型番列が無ければ先頭列）
pub fn detect_columns(headers: &[String]) -> ColumnMap {
    let find = |keywords: &[&str]| {
        headers.iter().position(|h| {
            let h = h.to_lowercase();
            keywords.iter().any(|k| h.contains(k))
        })
    };

    ColumnMap {
        model: find(MODEL_KEYWORDS).unwrap_or(0),
        url: find(URL_KEYWORDS),
    }
}

fn row_from_cells(cells: &[String], columns: &ColumnMap) -> InputRow {
    let model_id = cells
        .get(columns.model)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let direct_url = columns
        .url
        .and_then(|i| cells.get(i))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    InputRow { model_id, direct_url }
}

/// セル値を文字列に（整数値の浮動小数は小数点なし）
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
