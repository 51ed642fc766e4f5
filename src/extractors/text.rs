// src/extractors/text.rs
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RUN_RE"));

/// Collapses every run of whitespace (tabs, newlines, NBSP...) to a single space and trims the ends.
pub fn normalize_spaces(raw: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(raw, " ").trim().to_string()
}
