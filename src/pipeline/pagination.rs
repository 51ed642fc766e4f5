// src/pipeline/pagination.rs
use std::time::Duration;

use crate::browser::{Affordance, PageDriver};
use crate::utils::error::DriverError;

/// Result of one attempt to move past the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    Advanced,
    /// The "next" control is missing from the render.
    NoAffordance,
    /// The "next" control is rendered but carries `disabled`.
    Disabled,
}

pub struct PaginationController {
    label: String,
    settle: Duration,
}

impl PaginationController {
    pub fn new(label: impl Into<String>, settle: Duration) -> Self {
        Self { label: label.into(), settle }
    }

    /// Moves to the next page when the control is present and enabled, then waits
    /// the settle delay. A failed click is returned as-is; it is never retried.
    pub async fn advance<D>(&self, driver: &mut D) -> Result<PageTurn, DriverError>
    where
        D: PageDriver + ?Sized,
    {
        match driver.next_affordance(&self.label).await? {
            Affordance::Absent => {
                tracing::info!("No '{}' control on this page; pagination finished", self.label);
                Ok(PageTurn::NoAffordance)
            }
            Affordance::Disabled => {
                tracing::info!("'{}' control is disabled; pagination finished", self.label);
                Ok(PageTurn::Disabled)
            }
            Affordance::Enabled => {
                driver.advance(&self.label).await?;
                tokio::time::sleep(self.settle).await;
                Ok(PageTurn::Advanced)
            }
        }
    }
}
