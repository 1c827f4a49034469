//! Name conversions shared by the build stages.
//!
//! ## Template variable names
//!
//! Page metadata keys are free-form (`Post date`, `This Page is Full of
//! Spiders!!1`), but template variables are identifiers. Keys are lowercased,
//! runs of anything outside `[a-z0-9_]` collapse to one `_`, edges are trimmed,
//! and the result gets a leading `_` so user keys never shadow system values:
//!
//! - `Post date` → `_post_date`
//! - `Alt text` → `_alt_text`
//! - `This Page is Full of Spiders!!1` → `_this_page_is_full_of_spiders_1`
//! - `page_name` → `page_name` (the one key kept as-is)
//!
//! ## Post ids
//!
//! Feed guids and CDATA placeholders use the page name lowercased with spaces
//! and `&` replaced by `_` (`Page 1` → `page_1`).

/// Extensions recognised as comic images when a page lists no `Filenames`.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "gif", "bmp", "webp", "webv", "svg", "eps",
];

/// Convert a metadata key into a template variable name.
pub fn format_user_variable(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 1);
    let mut in_run = false;
    for c in key.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    let name = out.trim_matches('_');
    if name == "page_name" {
        name.to_string()
    } else {
        format!("_{name}")
    }
}

/// Lowercase, with spaces and `&` replaced by `_`.
pub fn post_id(text: &str) -> String {
    text.to_lowercase().replace([' ', '&'], "_")
}

/// Escape `& < > " '` for use in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Whether a file in a page directory should be picked up as a comic image.
///
/// Names starting with `_` (generated thumbnails) are skipped.
pub fn is_comic_image(file_name: &str) -> bool {
    if file_name.starts_with('_') {
        return false;
    }
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
