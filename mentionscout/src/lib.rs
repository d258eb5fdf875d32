//! # Mentionscout
//!
//! Finds web pages that mention a brand by name without linking to the
//! brand's domain, and records them as outreach opportunities.
//!
//! Mentionscout provides:
//!
//! - **Paged search**: walks a search API's result pages per query under a page budget
//! - **Pre-fetch filtering**: operator exclusion list and duplicate suppression
//! - **Mention classification**: a textual mention without a hyperlink is a finding
//! - **Record stores**: pluggable tabular stores for queries and opportunities
//! - **Quota tracking**: a per-day counter of search calls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mentionscout::prelude::*;
//!
//! let config = ScoutConfig::from_json_file("mentionscout.json")?.with_env_overrides();
//! let store = Arc::new(JsonFileStore::open("store.json")?);
//! let scout = MentionScout::from_config(config, store.clone(), store)?;
//!
//! let report = scout.run_scheduled().await?;
//! println!("{} new opportunities", report.findings());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod archive;
pub mod config;
pub mod core;
pub mod discovery;
pub mod errors;
pub mod pipeline;
pub mod quota;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::archive::{archive_opportunity, on_status_change, ArchiveOutcome};
    pub use crate::config::{
        BrandConfig, FetchConfig, RetryConfig, ScoutConfig, SearchConfig, StoreLayout,
    };
    pub use crate::core::{Opportunity, OpportunityStatus, Query, RunStatus};
    pub use crate::discovery::{
        ExclusionList, FilterDecision, KnownUrls, MentionClassifier, MentionDetector,
        PageFetcher, SearchPage, SearchProvider,
    };
    #[cfg(feature = "http")]
    pub use crate::discovery::{CustomSearchClient, HttpPageFetcher};
    pub use crate::errors::{MentionScoutError, Result};
    pub use crate::pipeline::{MentionScout, QueryReport, RunReport, StopReason};
    pub use crate::quota::{QuotaState, QuotaTracker};
    pub use crate::store::{JsonFileStore, KeyValueStore, MemoryStore, TabularStore};
    pub use crate::utils::{iso_timestamp, Timestamp};
    pub use std::sync::Arc;
}
