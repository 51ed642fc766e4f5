// src/utils/html_debug.rs
use std::fs;
use std::path::Path;

use regex::RegexBuilder;

use crate::utils::error::StorageError;

/// Saves a rendered page with every highlight span wrapped in a marker element.
/// `highlights` are byte ranges into `html`; overlapping ranges are merged into the first.
pub fn save_debug_html(
    html: &str,
    path: &Path,
    highlights: &[(usize, usize)],
) -> Result<(), StorageError> {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str(".highlight-keyword { background-color: #90EE90; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| h.0);

    let mut last_pos = 0;
    for (start, end) in sorted_highlights {
        if start < last_pos {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);
        debug_html.push_str(&format!(
            "<span class=\"highlight-keyword\" title=\"Position: {}-{}\">",
            start, end
        ));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");
        last_pos = end;
    }

    if last_pos < html.len() {
        debug_html.push_str(&html[last_pos..]);
    }
    debug_html.push_str("\n</body>\n</html>");

    fs::write(path, debug_html)?;

    tracing::debug!("Saved debug HTML to {}", path.display());
    Ok(())
}

/// Creates a debug copy of a page with every case-insensitive keyword hit highlighted.
pub fn create_debug_html(html: &str, path: &Path, keywords: &[String]) -> Result<(), StorageError> {
    let highlights = keyword_spans(html, keywords)?;
    save_debug_html(html, path, &highlights)
}

fn keyword_spans(html: &str, keywords: &[String]) -> Result<Vec<(usize, usize)>, StorageError> {
    if keywords.is_empty() {
        return Ok(Vec::new());
    }

    // Longest first so "bomba centrífuga" wins over "bomba" at the same offset
    let mut sorted: Vec<&String> = keywords.iter().collect();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let pattern = sorted
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| StorageError::SerializationError(format!("Invalid keyword pattern: {}", e)))?;

    Ok(re.find_iter(html).map(|m| (m.start(), m.end())).collect())
}
