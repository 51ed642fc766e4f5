// src/pipeline/mod.rs
pub mod pagination;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

use crate::browser::PageDriver;
use crate::extractors::{HeaderMarkers, RowExtractor, RowRecord, Vocabulary};
use crate::utils::error::{DriverError, PipelineError};
use crate::utils::html_debug;
use pagination::{PageTurn, PaginationController};

// --- Constants ---
pub const PETRONECT_PUBLIC_URL: &str = "https://www.petronect.com.br/irj/go/km/docs/pccshrcontent/Site%20Content%20%28Legacy%29/Portal2018/pt/lista_licitacoes_publicadas_ft.html";
pub const NEXT_PAGE_LABEL: &str = "Próximo";
pub const DEFAULT_MAX_PAGES: usize = 35;
pub const DEFAULT_SETTLE_MS: u64 = 1200;

// --- Configuration ---
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub listing_url: String,
    pub next_label: String,
    pub header: HeaderMarkers,
    pub min_cells: usize,
    /// Upper bound on page reads per run.
    pub max_pages: usize,
    pub settle: Duration,
    /// When set, every page's source (plus a keyword-annotated copy) is saved here.
    pub debug_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            listing_url: PETRONECT_PUBLIC_URL.to_string(),
            next_label: NEXT_PAGE_LABEL.to_string(),
            header: HeaderMarkers::default(),
            min_cells: crate::extractors::rows::MIN_CELLS,
            max_pages: DEFAULT_MAX_PAGES,
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            debug_dir: None,
        }
    }
}

// --- Results ---
/// Records of a finished run, unique by `line`, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<RowRecord>,
}

impl ResultSet {
    /// Keeps the first record for each distinct `line`.
    pub fn from_accumulated(rows: Vec<RowRecord>) -> Self {
        let mut unique: IndexMap<String, RowRecord> = IndexMap::with_capacity(rows.len());
        for row in rows {
            unique.entry(row.line.clone()).or_insert(row);
        }
        Self { records: unique.into_values().collect() }
    }

    pub fn records(&self) -> &[RowRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    NoAffordance,
    Disabled,
    PageCeiling,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub results: ResultSet,
    pub pages_read: usize,
    pub rows_matched: usize,
    pub stop_reason: StopReason,
}

// --- Pipeline ---
pub struct ExtractionPipeline {
    config: PipelineConfig,
    vocabulary: Vocabulary,
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig, vocabulary: Vocabulary) -> Self {
        Self { config, vocabulary }
    }

    /// One full pass: opens the listing, reads pages in order until the "next"
    /// control is gone, disabled, or the page ceiling is reached, then dedups.
    /// Any navigation failure aborts the run and discards what was collected.
    pub async fn run<D>(&self, driver: &mut D) -> Result<RunReport, PipelineError>
    where
        D: PageDriver + ?Sized,
    {
        let url = &self.config.listing_url;
        tracing::info!("Opening listing {}", url);
        driver
            .goto(url)
            .await
            .map_err(|source| PipelineError::Start { url: url.clone(), source })?;

        let extractor = RowExtractor::new(&self.vocabulary, &self.config.header)
            .with_min_cells(self.config.min_cells);
        let pagination = PaginationController::new(&self.config.next_label, self.config.settle);

        let mut accumulated: Vec<RowRecord> = Vec::new();
        let mut pages_read = 0;

        let stop_reason = loop {
            let page = pages_read + 1;
            let navigation = |source: DriverError| PipelineError::Navigation { page, source };

            let source_page = driver.current_page().await.map_err(navigation)?;
            let rows = driver.table_rows().await.map_err(navigation)?;
            let rows_seen = rows.len();
            let before = accumulated.len();
            accumulated.extend(extractor.extract(rows, &source_page));
            pages_read = page;

            tracing::info!(
                "Page {} ({}): {} rows read, {} in scope",
                page,
                source_page,
                rows_seen,
                accumulated.len() - before
            );

            if let Some(dir) = &self.config.debug_dir {
                self.save_debug_snapshot(&*driver, dir, page).await;
            }

            if pages_read >= self.config.max_pages {
                tracing::info!(
                    "Reached page ceiling of {}; stopping with {} rows",
                    self.config.max_pages,
                    accumulated.len()
                );
                break StopReason::PageCeiling;
            }

            match pagination.advance(&mut *driver).await.map_err(navigation)? {
                PageTurn::Advanced => continue,
                PageTurn::NoAffordance => break StopReason::NoAffordance,
                PageTurn::Disabled => break StopReason::Disabled,
            }
        };

        let rows_matched = accumulated.len();
        let results = ResultSet::from_accumulated(accumulated);
        tracing::info!(
            "Run finished after {} pages: {} matching rows, {} unique",
            pages_read,
            rows_matched,
            results.len()
        );

        Ok(RunReport { results, pages_read, rows_matched, stop_reason })
    }

    async fn save_debug_snapshot<D>(&self, driver: &D, dir: &Path, page: usize)
    where
        D: PageDriver + ?Sized,
    {
        let html = match driver.page_source().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Could not read source of page {} for debugging: {}", page, e);
                return;
            }
        };
        if let Err(e) = write_debug_files(&html, dir, page, self.vocabulary.keywords()) {
            tracing::warn!("Failed to save debug snapshot of page {}: {}", page, e);
        }
    }
}

fn write_debug_files(
    html: &str,
    dir: &Path,
    page: usize,
    keywords: &[String],
) -> Result<(), crate::utils::error::StorageError> {
    fs::create_dir_all(dir)?;
    let raw_path = dir.join(format!("page_{:03}.html", page));
    fs::write(&raw_path, html)?;
    tracing::info!("Saved page source to {}", raw_path.display());

    let annotated_path = dir.join(format!("page_{:03}_annotated.html", page));
    html_debug::create_debug_html(html, &annotated_path, keywords)
}
