//! Filename-safe normalization of (possibly translated) titles.

use regex::Regex;
use std::sync::LazyLock;

/// Longest filename we emit, in bytes; below common filesystem limits even
/// after role/language suffixes are appended.
pub const MAX_FILENAME_BYTES: usize = 200;

const PLACEHOLDER: &str = "Unknown_Title";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid regex"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNDERSCORE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("valid regex"));

/// Truncate to at most `max` bytes without splitting a character.
pub fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Convert free text into a filename-safe segment.
///
/// Path-unsafe and control characters become `_`, whitespace collapses to a
/// single `_`, runs of `_` collapse, edges are trimmed, the result is capped
/// at [`MAX_FILENAME_BYTES`] on a character boundary and is never empty.
pub fn make_filename_safe(text: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(text, "_");
    let replaced = WHITESPACE_RUNS.replace_all(&replaced, "_");
    let replaced = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    let trimmed = replaced.trim_matches('_');
    let capped = truncate_bytes(trimmed, MAX_FILENAME_BYTES).trim_end_matches('_');

    if capped.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        capped.to_string()
    }
}
