//! Protocol traits for discovery components.
//!
//! These traits are the network seams of the pipeline: one for the search
//! API and one for fetching candidate pages. Both have HTTP implementations
//! behind the `http` feature and scripted fakes in [`crate::testing`].

use async_trait::async_trait;

use super::models::SearchPage;
use crate::errors::Result;

/// Result of fetching a candidate page.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body as text.
    pub text: String,
}

impl FetchResult {
    /// Creates a result with a status and body.
    #[must_use]
    pub fn new(status_code: u16, text: impl Into<String>) -> Self {
        Self {
            status_code,
            text: text.into(),
        }
    }

    /// Only a plain 200 counts; redirects are followed by the client and any
    /// other status means there is nothing to inspect.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Protocol for the search API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Requests one page of results starting at the 1-based `start_index`.
    ///
    /// Never errors: failures come back as [`SearchPage::Failed`].
    async fn fetch_page(&self, query: &str, start_index: usize) -> SearchPage;
}

/// Protocol for fetching candidate pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a URL. Transport failures are errors; HTTP error statuses are
    /// returned as a normal [`FetchResult`].
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}
