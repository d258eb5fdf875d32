//! Test fixtures for discovery runs.

use crate::config::{BrandConfig, ScoutConfig, SearchConfig, StoreLayout};
use crate::core::{Opportunity, Query};
use crate::store::{opportunity_to_record, query_to_record, MemoryStore, StoreData};

/// A valid configuration for the `Myntra` / `myntra.com` brand.
#[must_use]
pub fn sample_config() -> ScoutConfig {
    ScoutConfig::new(BrandConfig::new("Myntra", "myntra.com"))
        .with_search(SearchConfig::new("test-key", "test-cx"))
}

/// Builder for a pre-populated [`MemoryStore`].
#[derive(Debug, Default)]
pub struct StoreFixture {
    layout: StoreLayout,
    data: StoreData,
}

impl StoreFixture {
    /// Creates a fixture using the default layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom layout.
    #[must_use]
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Adds a query row.
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.data
            .append(&self.layout.queries_collection, query_to_record(&query));
        self
    }

    /// Sets the comma-separated exclusion list.
    #[must_use]
    pub fn with_exclusions(mut self, raw: &str) -> Self {
        self.data
            .scalars
            .insert(self.layout.exclusions_location.clone(), raw.to_string());
        self
    }

    /// Adds an active opportunity row.
    #[must_use]
    pub fn with_active(mut self, opportunity: &Opportunity) -> Self {
        self.data.append(
            &self.layout.active_collection,
            opportunity_to_record(opportunity),
        );
        self
    }

    /// Adds an archived opportunity row.
    #[must_use]
    pub fn with_archived(mut self, opportunity: &Opportunity) -> Self {
        self.data.append(
            &self.layout.archive_collection,
            opportunity_to_record(opportunity),
        );
        self
    }

    /// Builds the store.
    #[must_use]
    pub fn build(self) -> MemoryStore {
        MemoryStore::with_data(self.data)
    }
}
