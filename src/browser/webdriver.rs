// src/browser/webdriver.rs
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;

use crate::browser::{Affordance, BrowserConfig, PageDriver, RowCells};
use crate::utils::error::DriverError;

const ROW_SELECTOR: &str = "table tr";
const CELL_SELECTOR: &str = "td, th";

/// A live Chrome tab behind a WebDriver server.
pub struct WebDriverPage {
    driver: WebDriver,
}

impl WebDriverPage {
    /// Opens a new browser session against `config.webdriver_url`.
    pub async fn connect(config: &BrowserConfig) -> Result<Self, DriverError> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.set_headless()?;
        }
        caps.add_arg(&format!("--lang={}", config.locale))?;
        caps.add_arg("--window-size=1366,900")?;

        tracing::info!(
            "Connecting to WebDriver at {} (headless: {})",
            config.webdriver_url,
            config.headless
        );
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps).await?;

        Ok(Self { driver })
    }

    /// Ends the browser session.
    pub async fn quit(self) -> Result<(), DriverError> {
        self.driver.quit().await?;
        Ok(())
    }

    async fn find_affordance(&self, label: &str) -> Result<Option<WebElement>, DriverError> {
        let xpath = format!("//*[text()[normalize-space(.)={}]]", xpath_literal(label));
        let mut matches = self.driver.find_all(By::XPath(xpath)).await?;
        if matches.len() > 1 {
            tracing::debug!("{} elements labelled '{}', using the first", matches.len(), label);
        }
        Ok(if matches.is_empty() { None } else { Some(matches.remove(0)) })
    }
}

async fn read_cells(row: &WebElement) -> RowCells {
    let mut texts = Vec::new();
    for cell in row.find_all(By::Css(CELL_SELECTOR)).await? {
        texts.push(cell.text().await?);
    }
    Ok(texts)
}

#[async_trait::async_trait]
impl PageDriver for WebDriverPage {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        tracing::debug!("Navigating to {}", url);
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_page(&self) -> Result<String, DriverError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn table_rows(&self) -> Result<Vec<RowCells>, DriverError> {
        let rows = self.driver.find_all(By::Css(ROW_SELECTOR)).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            // A re-render can detach a row mid-read; that row alone is lost
            out.push(read_cells(row).await);
        }
        Ok(out)
    }

    async fn next_affordance(&self, label: &str) -> Result<Affordance, DriverError> {
        let Some(element) = self.find_affordance(label).await? else {
            return Ok(Affordance::Absent);
        };
        if element.attr("disabled").await?.is_some() {
            return Ok(Affordance::Disabled);
        }
        Ok(Affordance::Enabled)
    }

    async fn advance(&mut self, label: &str) -> Result<(), DriverError> {
        let element = self
            .find_affordance(label)
            .await?
            .ok_or_else(|| DriverError::ElementNotFound(format!("next control '{}'", label)))?;
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        Ok(self.driver.source().await?)
    }
}

/// Quotes `value` as an XPath 1.0 string literal.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xpath_literal_quotes_labels() {
        assert_eq!(xpath_literal("Próximo"), "'Próximo'");
        assert_eq!(xpath_literal("Next 'page'"), "\"Next 'page'\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')"
        );
    }
}
