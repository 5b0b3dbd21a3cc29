#![forbid(unsafe_code)]

//! Whitespace normalization for free-text fields.

/// Trim surrounding whitespace and collapse every internal whitespace run
/// (spaces, tabs, newlines, any Unicode whitespace) to one ASCII space.
///
/// Applied before validation and before a value becomes a URL segment.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// True when the value is empty after sanitization.
#[must_use]
pub fn is_blank(raw: &str) -> bool {
    raw.chars().all(char::is_whitespace)
}
