//! メモリ上のZIP
//!
//! 同じパスへの書き込みは許さない。画像は `{型番}/{ファイル名}` に格納し、
//! 衝突したらインデックスを付けて別名にする。

use crate::error::{AppError, Result};
use montbell_image_common::naming::disambiguated_name;
use montbell_image_common::DownloadedAsset;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
    paths: HashSet<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
            paths: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// 未使用のパスを決める（同じ入力なら常に同じ結果）
    pub fn unique_path(&self, model_id: &str, file_name: &str, index: usize) -> String {
        let folder = folder_name(model_id);
        let path = format!("{}/{}", folder, file_name);
        if !self.contains(&path) {
            return path;
        }

        let mut attempt = 1;
        loop {
            let path = format!("{}/{}", folder, disambiguated_name(file_name, index, attempt));
            if !self.contains(&path) {
                return path;
            }
            attempt += 1;
        }
    }

    pub fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        if self.paths.contains(path) {
            return Err(AppError::Archive(format!("パスが重複しています: {}", path)));
        }
        self.writer.start_file(path, self.options)?;
        self.writer.write_all(bytes)?;
        self.paths.insert(path.to_string());
        Ok(())
    }

    pub fn add_asset(&mut self, asset: &DownloadedAsset) -> Result<()> {
        self.add_file(&asset.archive_path, &asset.bytes)
    }

    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}

/// 型番をフォルダ名に
///
/// `%` とパス区切りはパーセントエンコードする（型番ごとに別フォルダ）。
/// `.` だけの名前は `%2E` に置き換える。
pub fn folder_name(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.chars().all(|c| c == '.') {
        return "%2E".repeat(trimmed.len().max(1));
    }

    let mut folder = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '%' => folder.push_str("%25"),
            '/' => folder.push_str("%2F"),
            '\\' => folder.push_str("%5C"),
            _ => folder.push(c),
        }
    }
    folder
}
