// src/extractors/rows.rs

// --- Imports ---
use serde::{Deserialize, Serialize};

use crate::browser::RowCells;
use crate::extractors::scope::Vocabulary;
use crate::extractors::text::normalize_spaces;

// --- Constants ---
pub const CELL_DELIMITER: &str = " | ";
pub const MIN_CELLS: usize = 3;

// --- Data Structures ---
/// One in-scope table row observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    pub line: String,        // Normalised cells joined by " | "
    pub source_page: String, // URL (or snapshot id) the row was read from
}

/// Column-label tokens that together identify the listing's header row.
#[derive(Debug, Clone)]
pub struct HeaderMarkers {
    pub tokens: Vec<String>,
}

impl HeaderMarkers {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { tokens: tokens.into_iter().map(Into::into).collect() }
    }

    /// A line is a header when it carries every label token (case-sensitive).
    pub fn is_header(&self, line: &str) -> bool {
        !self.tokens.is_empty() && self.tokens.iter().all(|t| line.contains(t.as_str()))
    }
}

impl Default for HeaderMarkers {
    fn default() -> Self {
        Self::new(["Número", "Objeto"])
    }
}

// --- Row Extractor ---
pub struct RowExtractor<'a> {
    vocabulary: &'a Vocabulary,
    header: &'a HeaderMarkers,
    min_cells: usize,
}

impl<'a> RowExtractor<'a> {
    pub fn new(vocabulary: &'a Vocabulary, header: &'a HeaderMarkers) -> Self {
        Self { vocabulary, header, min_cells: MIN_CELLS }
    }

    pub fn with_min_cells(mut self, min_cells: usize) -> Self {
        self.min_cells = min_cells;
        self
    }

    /// Lazily turns one page's rows into in-scope records.
    /// Rows that failed to read, layout rows, header rows and out-of-scope rows are dropped.
    pub fn extract<'r>(
        &'r self,
        rows: Vec<RowCells>,
        source_page: &'r str,
    ) -> impl Iterator<Item = RowRecord> + 'r {
        let vocabulary: &'r Vocabulary = self.vocabulary;
        let header: &'r HeaderMarkers = self.header;
        let min_cells = self.min_cells;

        rows.into_iter()
            .enumerate()
            .filter_map(move |(index, row)| match row {
                Ok(cells) => accept_cells(&cells, vocabulary, header, min_cells).map(|line| RowRecord {
                    line,
                    source_page: source_page.to_string(),
                }),
                Err(e) => {
                    tracing::debug!("Skipping row {} on {}: {}", index, source_page, e);
                    None
                }
            })
    }
}

fn accept_cells(
    cells: &[String],
    vocabulary: &Vocabulary,
    header: &HeaderMarkers,
    min_cells: usize,
) -> Option<String> {
    if cells.len() < min_cells {
        return None;
    }

    let line = join_cells(cells)?;
    if header.is_header(&line) {
        tracing::trace!("Skipping header row: '{}'", line);
        return None;
    }
    if !vocabulary.matches(&line) {
        return None;
    }
    Some(line)
}

/// Joins normalised cells with the delimiter. `None` when every cell is blank.
pub fn join_cells(cells: &[String]) -> Option<String> {
    let normalized: Vec<String> = cells.iter().map(|c| normalize_spaces(c)).collect();
    if normalized.iter().all(|c| c.is_empty()) {
        return None;
    }
    // Blank interior cells would otherwise leave a double space around the delimiter
    let line = normalize_spaces(&normalized.join(CELL_DELIMITER));
    Some(line)
}
