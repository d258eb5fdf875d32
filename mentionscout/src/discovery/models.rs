//! Search API payloads and page outcomes.

use serde::{Deserialize, Serialize};

use crate::errors::{MentionScoutError, Result};

/// One ranked search result. Only `url` is consumed by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultItem {
    /// Result URL.
    #[serde(rename = "link")]
    pub url: String,
    /// Result title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Result snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Display hostname.
    #[serde(default, rename = "displayLink", skip_serializing_if = "Option::is_none")]
    pub display_link: Option<String>,
}

impl SearchResultItem {
    /// Creates an item with just a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Response body of the search API. Every field but `items` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Result items; absent when there are no (more) results.
    #[serde(default)]
    pub items: Option<Vec<SearchResultItem>>,
}

/// Outcome of requesting one page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPage {
    /// The page held results.
    Items(Vec<SearchResultItem>),
    /// The API reported no (more) results.
    Exhausted,
    /// The request failed; the reason is for logs and reports.
    Failed(String),
}

impl SearchPage {
    /// Builds a page outcome from a list of items.
    #[must_use]
    pub fn from_items(items: Vec<SearchResultItem>) -> Self {
        if items.is_empty() {
            Self::Exhausted
        } else {
            Self::Items(items)
        }
    }

    /// Whether pagination for the query should stop here.
    #[must_use]
    pub fn ends_pagination(&self) -> bool {
        !matches!(self, Self::Items(_))
    }

    /// Result items, empty for exhausted or failed pages.
    #[must_use]
    pub fn items(&self) -> &[SearchResultItem] {
        match self {
            Self::Items(items) => items,
            Self::Exhausted | Self::Failed(_) => &[],
        }
    }
}

/// Parses a successful search API body into a page outcome.
pub fn parse_search_response(body: &str) -> Result<SearchPage> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| MentionScoutError::parse(format!("search response: {e}")))?;
    let items = response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter(|item| !item.url.trim().is_empty())
        .collect();
    Ok(SearchPage::from_items(items))
}
