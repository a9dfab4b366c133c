//! Percent-encoding for query strings and page paths

use std::fmt::Write;

/// Percent-encode `text`, leaving ASCII alphanumerics, `_.-~` and any byte in
/// `safe` untouched. Spaces become `%20`, never `+`.
pub fn quote(text: &str, safe: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || b"_.-~".contains(&byte) || safe.as_bytes().contains(&byte)
        {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
    }
    out
}
