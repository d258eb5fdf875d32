//! Scripted collaborators for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::discovery::{FetchResult, PageFetcher, SearchPage, SearchProvider, SearchResultItem};
use crate::errors::{MentionScoutError, Result};
use crate::quota::QuotaTracker;
use crate::store::{KeyValueStore, Record, TabularStore};

/// A search provider that serves pre-recorded pages.
///
/// Pages are scripted per query in start-index order (1, 11, 21, ...).
/// Anything not scripted comes back as [`SearchPage::Exhausted`].
#[derive(Debug, Default)]
pub struct ScriptedSearchProvider {
    pages: HashMap<String, Vec<SearchPage>>,
    results_per_page: usize,
    quota: Option<QuotaTracker>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedSearchProvider {
    /// Creates a provider with no scripted pages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            results_per_page: 10,
            ..Self::default()
        }
    }

    /// Scripts the next page for `query`.
    #[must_use]
    pub fn with_page(mut self, query: impl Into<String>, page: SearchPage) -> Self {
        self.pages.entry(query.into()).or_default().push(page);
        self
    }

    /// Scripts the next page for `query` as a list of result URLs.
    #[must_use]
    pub fn with_urls(self, query: impl Into<String>, urls: &[&str]) -> Self {
        let items = urls.iter().map(|u| SearchResultItem::new(*u)).collect();
        self.with_page(query, SearchPage::from_items(items))
    }

    /// Counts every item-bearing or exhausted page against `quota`, like a
    /// real client counts every 200 response.
    #[must_use]
    pub fn with_quota(mut self, quota: QuotaTracker) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Every `(query, start_index)` requested so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }

    /// Number of requests made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearchProvider {
    async fn fetch_page(&self, query: &str, start_index: usize) -> SearchPage {
        self.calls.lock().push((query.to_string(), start_index));

        let page_number = start_index.saturating_sub(1) / self.results_per_page.max(1);
        let page = self
            .pages
            .get(query)
            .and_then(|pages| pages.get(page_number))
            .cloned()
            .unwrap_or(SearchPage::Exhausted);

        if let (Some(quota), false) = (&self.quota, matches!(page, SearchPage::Failed(_))) {
            quota.record_call().await;
        }
        page
    }
}

/// A page fetcher that serves fixed responses by URL.
///
/// Unknown URLs fail with a transport error.
#[derive(Debug, Default)]
pub struct StaticPageFetcher {
    pages: HashMap<String, FetchResult>,
    fetched: Mutex<Vec<String>>,
}

impl StaticPageFetcher {
    /// Creates a fetcher with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a response for `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, result: FetchResult) -> Self {
        self.pages.insert(url.into(), result);
        self
    }

    /// Registers a 200 response with `html` for `url`.
    #[must_use]
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page(url, FetchResult::new(200, html))
    }

    /// URLs fetched so far, in order.
    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        self.fetched.lock().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| MentionScoutError::transport(format!("connection refused: {url}")))
    }
}

/// A store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    /// Creates the store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn fail<T>() -> Result<T> {
        Err(MentionScoutError::store("store unavailable"))
    }
}

#[async_trait]
impl TabularStore for FailingStore {
    async fn append(&self, _collection: &str, _record: Record) -> Result<()> {
        Self::fail()
    }

    async fn read_all(&self, _collection: &str) -> Result<Vec<Record>> {
        Self::fail()
    }

    async fn update_row(&self, _collection: &str, _index: usize, _record: Record) -> Result<()> {
        Self::fail()
    }

    async fn delete_row(&self, _collection: &str, _index: usize) -> Result<Record> {
        Self::fail()
    }

    async fn read_scalar(&self, _location: &str) -> Result<Option<String>> {
        Self::fail()
    }

    async fn write_scalar(&self, _location: &str, _value: &str) -> Result<()> {
        Self::fail()
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Self::fail()
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Self::fail()
    }
}
