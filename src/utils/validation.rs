use std::path::Path;

/// Longest extension kept on a staged file name.
const MAX_EXTENSION_LEN: usize = 16;

/// Returns the lowercase extension of a client-supplied file name, including
/// the leading dot, or an empty string.
///
/// Only the final path component is considered, and extensions containing
/// anything other than ASCII alphanumerics are dropped so the result is safe
/// to embed in a staging path and an object key.
pub fn file_extension(original_name: &str) -> String {
    let name = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    match name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &name[idx + 1..];
            if ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                format!(".{}", ext.to_lowercase())
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

/// Strips a declared content type down to `type/subtype`, or `None` if it is
/// empty or not a valid header value.
pub fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    let normalized = content_type?.split(';').next()?.trim().to_lowercase();
    if normalized.is_empty() || !normalized.contains('/') || normalized.chars().any(char::is_control)
    {
        return None;
    }
    Some(normalized)
}
