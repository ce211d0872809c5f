//! Cursor-following page walker.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::client::{redact_url, GraphClient};
use super::error::GraphError;
use super::models::Page;

/// Walks a listing by following `paging.next` links.
///
/// Pages are fetched lazily, one request at a time. The walk ends when a page has no
/// next link or on the first error; there is no retry.
pub struct Paginator<'a> {
    client: &'a GraphClient,
    next: Option<String>,
    delay: Duration,
    pages_fetched: usize,
}

/// Everything a walk accumulated, plus the error that ended it early, if any.
#[derive(Debug)]
pub struct Collected {
    pub items: Vec<Value>,
    pub pages: usize,
    pub error: Option<GraphError>,
}

impl<'a> Paginator<'a> {
    /// Start a walk at `start_url`, sleeping `delay` between consecutive pages.
    #[must_use]
    pub fn new(client: &'a GraphClient, start_url: String, delay: Duration) -> Self {
        Self {
            client,
            next: Some(start_url),
            delay,
            pages_fetched: 0,
        }
    }

    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the listing is exhausted or after an error was returned.
    pub async fn next_page(&mut self) -> Option<Result<Page, GraphError>> {
        let url = self.next.take()?;

        if self.pages_fetched > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.client.get_page(&url).await {
            Ok(page) => {
                self.pages_fetched += 1;
                self.next = page.next_url().map(str::to_owned);
                debug!(
                    page = self.pages_fetched,
                    items = page.data.len(),
                    has_next = self.next.is_some(),
                    "Fetched page"
                );
                Some(Ok(page))
            }
            Err(e) => {
                warn!(url = %redact_url(&url), error = %e, "Page walk aborted");
                Some(Err(e))
            }
        }
    }

    /// Walk every remaining page, returning all items collected before the walk ended.
    pub async fn collect_all(mut self) -> Collected {
        let mut items = Vec::new();
        let mut error = None;

        while let Some(result) = self.next_page().await {
            match result {
                Ok(page) => items.extend(page.data),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        Collected {
            items,
            pages: self.pages_fetched,
            error,
        }
    }
}
