// src/browser/mod.rs
pub mod provision;
pub mod snapshot;
pub mod webdriver;

pub use snapshot::HtmlSnapshotDriver;
pub use webdriver::WebDriverPage;

use crate::utils::error::DriverError;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Cell texts of one table row, or the error hit while reading it.
pub type RowCells = Result<Vec<String>, DriverError>;

/// Observed state of the "next page" control on the current render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Absent,
    Disabled,
    Enabled,
}

/// The single page/tab a run drives. Navigation takes `&mut self`: the pipeline
/// owns the page exclusively for the whole run.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Loads `url` and waits for the browser's own navigation signal.
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// Identifier of the page currently rendered (its URL for a live browser).
    async fn current_page(&self) -> Result<String, DriverError>;

    /// Every `tr` of every table in document order, with `td`/`th` texts.
    async fn table_rows(&self) -> Result<Vec<RowCells>, DriverError>;

    /// Looks for an element whose own text equals `label` exactly.
    async fn next_affordance(&self, label: &str) -> Result<Affordance, DriverError>;

    /// Scrolls the `label` control into view and activates it.
    async fn advance(&mut self, label: &str) -> Result<(), DriverError>;

    /// Serialized DOM of the current render.
    async fn page_source(&self) -> Result<String, DriverError>;
}

/// Settings for the live browser session.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub locale: String,
    pub chromedriver: Option<std::path::PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            locale: "pt-BR".to_string(),
            chromedriver: None,
        }
    }
}
