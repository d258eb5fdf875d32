//! Search, filtering and mention classification.
//!
//! This module provides:
//! - Search API payload models and page outcomes
//! - Protocol traits for the search API and page fetching
//! - HTTP implementations of both (feature `http`)
//! - Pre-fetch URL filtering
//! - The unlinked-mention heuristic

mod classifier;
#[cfg(feature = "http")]
mod fetcher;
mod filter;
mod models;
#[cfg(feature = "http")]
mod pager;
mod protocols;

pub use classifier::{clean_fragment, Detection, MentionClassifier, MentionDetector, SNIPPET_RADIUS};
#[cfg(feature = "http")]
pub use fetcher::HttpPageFetcher;
pub use filter::{
    evaluate_url, extract_hostname, should_process, ExclusionList, FilterDecision, KnownUrls,
};
pub use models::{parse_search_response, SearchPage, SearchResponse, SearchResultItem};
#[cfg(feature = "http")]
pub use pager::CustomSearchClient;
#[cfg(test)]
pub use protocols::MockSearchProvider;
pub use protocols::{FetchResult, PageFetcher, SearchProvider};
