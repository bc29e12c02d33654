//! ZIP内のファイル名決定

use url::Url;

/// Content-Type から拡張子を推定
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match mime.as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// URLのパス末尾からファイル名を取り出す。取れなければ `{model_id}_{index}.{ext}`
pub fn file_name_from_url(
    url: &str,
    model_id: &str,
    index: usize,
    content_type: Option<&str>,
) -> String {
    let from_path = Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|name| !name.is_empty())
    });

    from_path.unwrap_or_else(|| {
        format!("{}_{}.{}", model_id, index, extension_for_content_type(content_type))
    })
}

/// `name.ext` → (`name`, `.ext`)
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(pos) => file_name.split_at(pos),
    }
}

/// 衝突時の候補名を順に返す: `name_{index}.ext`, `name_{index}_2.ext`, ...
pub fn disambiguated_name(file_name: &str, index: usize, attempt: usize) -> String {
    let (stem, ext) = split_extension(file_name);
    if attempt <= 1 {
        format!("{}_{}{}", stem, index, ext)
    } else {
        format!("{}_{}_{}{}", stem, index, attempt, ext)
    }
}
