//! Charset discovery and name normalization
//!
//! Charsets can be declared in two places: the `Content-Type` response header
//! and a `<meta>` tag near the top of the document. The document declaration
//! wins when both are present.

use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8};
use regex::Regex;

/// Number of leading bytes scanned for a `<meta>` charset declaration
pub const SNIFF_LIMIT: usize = 2048;

/// Extracts the charset parameter from a `Content-Type` header value
///
/// # Example
///
/// ```
/// use keiba_racecard::encoding::charset_from_content_type;
///
/// assert_eq!(
///     charset_from_content_type("text/html; charset=EUC-JP"),
///     Some("EUC-JP".to_string())
/// );
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)charset\s*=\s*["']?([^;"'\s]+)"#).ok()?;
    re.captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Looks for a charset declared by a `<meta>` tag in the head of the document
///
/// Only the first [`SNIFF_LIMIT`] bytes are inspected, and only their ASCII
/// content: any byte outside 7-bit range is blanked out, so the scan works
/// regardless of the document's real encoding. Both
/// `<meta charset="...">` and
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">` match.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head: String = bytes
        .iter()
        .take(SNIFF_LIMIT)
        .map(|&b| if b.is_ascii() { b as char } else { ' ' })
        .collect();

    let re = Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#).ok()?;
    re.captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalizes a charset name for alias matching
///
/// Case-folds and strips `-`, `_`, and spaces, so `Shift_JIS`, `shift-jis`
/// and `SHIFTJIS` all normalize to `shiftjis`.
pub fn normalize_charset(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves a declared charset name to a decoder
///
/// Known Japanese aliases are mapped first; anything else goes through the
/// WHATWG label table. Returns `None` for names no decoder exists for.
pub fn lookup_charset(name: &str) -> Option<&'static Encoding> {
    match normalize_charset(name).as_str() {
        "sjis" | "shiftjis" | "xsjis" | "cp932" | "ms932" | "windows31j" => Some(SHIFT_JIS),
        "eucjp" | "xeucjp" => Some(EUC_JP),
        "utf8" => Some(UTF_8),
        "iso2022jp" => Some(ISO_2022_JP),
        _ => Encoding::for_label(name.trim().as_bytes()),
    }
}
