//! Persistent record types: search queries and discovered opportunities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::OpportunityStatus;

/// An operator-maintained search query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Query {
    /// Query text sent to the search API.
    pub text: String,
    /// When the query was last fully processed.
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Query {
    /// Creates a query that has never been checked.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            last_checked_at: None,
        }
    }

    /// Sets the last-checked time.
    #[must_use]
    pub fn with_last_checked_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_checked_at = Some(at);
        self
    }

    /// Blank rows are kept in the store but never searched.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Stamps the query as checked.
    pub fn mark_checked(&mut self, at: DateTime<Utc>) {
        self.last_checked_at = Some(at);
    }
}

/// A page that mentions the brand without linking to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Opportunity {
    /// Page URL, unique across active and archived opportunities.
    pub url: String,
    /// Cleaned text around the first mention, wrapped in `...`.
    pub context_snippet: String,
    /// When the mention was found.
    pub discovered_at: DateTime<Utc>,
    /// Outreach status.
    #[serde(default)]
    pub status: OpportunityStatus,
}

impl Opportunity {
    /// Creates a fresh opportunity with status `New`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        context_snippet: impl Into<String>,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            context_snippet: context_snippet.into(),
            discovered_at,
            status: OpportunityStatus::New,
        }
    }

    /// Returns a copy carrying a different status.
    #[must_use]
    pub fn with_status(mut self, status: OpportunityStatus) -> Self {
        self.status = status;
        self
    }
}
