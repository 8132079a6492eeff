//! Shared helpers for provider recognizers.

use regex::Regex;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Normalizes a URL copied out of comment text: trims whitespace and
/// unescapes HTML `&amp;` entities left by the comment renderer.
#[must_use]
pub fn normalize_comment_url(url: &str) -> String {
    url.trim().replace("&amp;", "&")
}
