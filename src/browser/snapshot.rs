// src/browser/snapshot.rs
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::browser::{Affordance, PageDriver, RowCells};
use crate::extractors::text::normalize_spaces;
use crate::utils::error::DriverError;

// --- CSS Selectors (Lazy Static) ---
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table tr").expect("Failed to compile ROW_SELECTOR")
});

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR")
});

static ANY_ELEMENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body *").expect("Failed to compile ANY_ELEMENT_SELECTOR")
});

/// One saved render of the listing.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub id: String,
    pub html: String,
}

/// Replays an ordered sequence of saved pages. Activating the "next" control
/// moves to the following snapshot, the same way a click re-renders the live table.
#[derive(Debug, Clone)]
pub struct HtmlSnapshotDriver {
    pages: Vec<PageSnapshot>,
    current: usize,
}

impl HtmlSnapshotDriver {
    pub fn new(pages: Vec<PageSnapshot>) -> Self {
        Self { pages, current: 0 }
    }

    /// Builds a driver from `(id, html)` pairs.
    pub fn from_pages<I, S, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (S, H)>,
        S: Into<String>,
        H: Into<String>,
    {
        Self::new(
            pages
                .into_iter()
                .map(|(id, html)| PageSnapshot { id: id.into(), html: html.into() })
                .collect(),
        )
    }

    /// Loads every `*.html` file of `dir` in file-name order, skipping annotated debug copies.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, DriverError> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "html"))
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map_or(true, |s| !s.ends_with("_annotated"))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(DriverError::Snapshot(format!(
                "No HTML snapshots found in {}",
                dir.display()
            )));
        }

        let mut pages = Vec::with_capacity(paths.len());
        for path in paths {
            let html = fs::read_to_string(&path)?;
            pages.push((path.display().to_string(), html));
        }
        tracing::info!("Loaded {} page snapshots from {}", pages.len(), dir.display());

        Ok(Self::from_pages(pages))
    }

    /// Number of times the "next" control was activated since `goto`.
    #[cfg(test)]
    pub fn advances(&self) -> usize {
        self.current
    }

    fn page(&self) -> Result<&PageSnapshot, DriverError> {
        self.pages
            .get(self.current)
            .ok_or_else(|| DriverError::Snapshot("No snapshot loaded".to_string()))
    }

    fn document(&self) -> Result<Html, DriverError> {
        Ok(Html::parse_document(&self.page()?.html))
    }
}

/// First element with an own text node equal to `label` once whitespace is
/// normalised, like XPath `normalize-space(.)` on the live page.
fn find_labelled<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    let label = normalize_spaces(label);
    document.select(&ANY_ELEMENT_SELECTOR).find(|element| {
        element
            .children()
            .filter_map(|node| node.value().as_text())
            .any(|text| normalize_spaces(text) == label)
    })
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "li", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Approximates the browser's `innerText`: `<br>` and block boundaries become
/// line breaks instead of gluing adjacent words together.
fn inner_text(element: ElementRef) -> String {
    let mut out = String::new();
    push_inner_text(element, &mut out);
    out
}

fn push_inner_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        match child.value().name() {
            "br" => out.push('\n'),
            "script" | "style" | "template" => {}
            name if BLOCK_TAGS.contains(&name) => {
                out.push('\n');
                push_inner_text(child, out);
                out.push('\n');
            }
            _ => push_inner_text(child, out),
        }
    }
}

#[async_trait::async_trait]
impl PageDriver for HtmlSnapshotDriver {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        if self.pages.is_empty() {
            return Err(DriverError::Navigation(format!("No snapshots to serve for {}", url)));
        }
        tracing::debug!("Replaying snapshots in place of {}", url);
        self.current = 0;
        Ok(())
    }

    async fn current_page(&self) -> Result<String, DriverError> {
        Ok(self.page()?.id.clone())
    }

    async fn table_rows(&self) -> Result<Vec<RowCells>, DriverError> {
        let document = self.document()?;
        let rows: Vec<RowCells> = document
            .select(&ROW_SELECTOR)
            .map(|row| {
                Ok(row
                    .select(&CELL_SELECTOR)
                    .map(inner_text)
                    .collect::<Vec<String>>())
            })
            .collect();
        Ok(rows)
    }

    async fn next_affordance(&self, label: &str) -> Result<Affordance, DriverError> {
        let document = self.document()?;
        Ok(match find_labelled(&document, label) {
            None => Affordance::Absent,
            Some(element) if element.value().attr("disabled").is_some() => Affordance::Disabled,
            Some(_) => Affordance::Enabled,
        })
    }

    async fn advance(&mut self, label: &str) -> Result<(), DriverError> {
        let found = {
            let document = self.document()?;
            find_labelled(&document, label).is_some()
        };
        if !found {
            return Err(DriverError::ElementNotFound(format!("next control '{}'", label)));
        }
        if self.current + 1 >= self.pages.len() {
            return Err(DriverError::Navigation(format!(
                "No snapshot after {}",
                self.page()?.id
            )));
        }
        self.current += 1;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        Ok(self.page()?.html.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const PAGE_ONE: &str = r#"
        <html><body>
        <table>
          <tr><th>Número</th><th>Objeto</th><th>Situação</th></tr>
          <tr><td>7001</td><td>Fornecimento de
              bomba OH2</td><td>Aberta</td></tr>
        </table>
        <div class="pager"><span>Anterior</span> <button>Próximo</button></div>
        </body></html>
    "#;

    const PAGE_TWO: &str = r#"
        <html><body>
        <table><tr><td>7002</td><td>Pintura</td><td>Aberta</td></tr></table>
        <button disabled>Próximo</button>
        </body></html>
    "#;

    #[tokio::test]
    async fn reads_rows_and_cells_in_document_order() {
        let mut driver = HtmlSnapshotDriver::from_pages([("p1", PAGE_ONE)]);
        assert_ok!(driver.goto("https://listing").await);

        let rows: Vec<Vec<String>> = driver
            .table_rows()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Número", "Objeto", "Situação"]);
        assert_eq!(rows[1][0], "7001");
        assert!(rows[1][1].contains("bomba OH2"));
    }

    #[tokio::test]
    async fn detects_affordance_states_and_advances() {
        let mut driver = HtmlSnapshotDriver::from_pages([("p1", PAGE_ONE), ("p2", PAGE_TWO)]);
        driver.goto("https://listing").await.unwrap();

        assert_eq!(driver.next_affordance("Próximo").await.unwrap(), Affordance::Enabled);
        assert_eq!(driver.next_affordance("Próx").await.unwrap(), Affordance::Absent);

        assert_ok!(driver.advance("Próximo").await);
        assert_eq!(driver.current_page().await.unwrap(), "p2");
        assert_eq!(driver.next_affordance("Próximo").await.unwrap(), Affordance::Disabled);
        assert_eq!(driver.advances(), 1);
    }

    #[tokio::test]
    async fn line_breaks_inside_cells_separate_words() {
        let html = r#"<table><tr>
            <td>7003</td><td>Bomba<br>centrífuga entre<br/>mancais</td>
            <td><p>Aberta</p><p>Prazo 10/05</p></td>
        </tr></table>"#;
        let driver = HtmlSnapshotDriver::from_pages([("p1", html)]);

        let cells = driver.table_rows().await.unwrap().remove(0).unwrap();
        assert_eq!(normalize_spaces(&cells[1]), "Bomba centrífuga entre mancais");
        assert_eq!(normalize_spaces(&cells[2]), "Aberta Prazo 10/05");
    }

    #[tokio::test]
    async fn script_text_is_not_cell_text() {
        let html = r#"<table><tr><td>7004<script>var bomba = 1;</script></td></tr></table>"#;
        let driver = HtmlSnapshotDriver::from_pages([("p1", html)]);

        let cells = driver.table_rows().await.unwrap().remove(0).unwrap();
        assert_eq!(cells, vec!["7004"]);
    }

    #[tokio::test]
    async fn label_match_normalises_inner_whitespace() {
        let html = r#"<div>
            <a>
              Próxima   página
            </a>
        </div>"#;
        let driver = HtmlSnapshotDriver::from_pages([("p1", html)]);

        assert_eq!(driver.next_affordance("Próxima página").await.unwrap(), Affordance::Enabled);
        assert_eq!(driver.next_affordance(" Próxima  página ").await.unwrap(), Affordance::Enabled);
        assert_eq!(driver.next_affordance("Próxima").await.unwrap(), Affordance::Absent);
    }

    #[tokio::test]
    async fn advancing_past_last_snapshot_fails() {
        let mut driver = HtmlSnapshotDriver::from_pages([("p1", PAGE_ONE)]);
        driver.goto("https://listing").await.unwrap();
        let err = assert_err!(driver.advance("Próximo").await);
        assert!(matches!(err, DriverError::Navigation(_)));
    }

    #[tokio::test]
    async fn goto_without_snapshots_fails() {
        let mut driver = HtmlSnapshotDriver::new(Vec::new());
        assert_err!(driver.goto("https://listing").await);
    }

    #[test]
    fn from_dir_orders_pages_and_skips_annotations() {
        let dir = std::env::temp_dir().join(format!("tender_snapshots_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("page_002.html"), PAGE_TWO).unwrap();
        fs::write(dir.join("page_001.html"), PAGE_ONE).unwrap();
        fs::write(dir.join("page_001_annotated.html"), "<p>ignored</p>").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let driver = HtmlSnapshotDriver::from_dir(&dir).unwrap();
        assert_eq!(driver.pages.len(), 2);
        assert!(driver.pages[0].id.ends_with("page_001.html"));
        assert!(driver.pages[1].id.ends_with("page_002.html"));

        fs::remove_dir_all(&dir).ok();
    }
}
