//! ファイル名からカラーコードを取り出す
//!
//! 命名規則: `1111222_NV.jpg` → `NV`、`cc_1111222_NV_2.jpg` → `NV`

/// 拡張子を除いた最後の `_` 区切りをカラーとみなす。
/// 末尾が数字のみなら連番なので一つ前を使う。
pub fn extract_color(filename: &str) -> Option<String> {
    let stem = match filename.rfind('.') {
        Some(0) | None => filename,
        Some(pos) => &filename[..pos],
    };

    if !stem.contains('_') {
        return None;
    }

    let parts: Vec<&str> = stem.split('_').collect();
    let last = *parts.last()?;

    let color = if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) && parts.len() > 1 {
        parts[parts.len() - 2]
    } else {
        last
    };

    if color.is_empty() {
        None
    } else {
        Some(color.to_string())
    }
}
