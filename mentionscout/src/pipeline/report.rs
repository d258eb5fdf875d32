//! Run and per-query reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::discovery::FilterDecision;
use crate::utils::{generate_run_id, now_utc};

/// Why pagination for a query stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with no items.
    Exhausted,
    /// A page request failed.
    Failed(String),
    /// The page budget was used up.
    #[default]
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::PageLimit => write!(f, "page limit"),
        }
    }
}

/// Counters for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReport {
    /// Query text.
    pub query: String,
    /// Page requests issued.
    pub pages_requested: usize,
    /// Result items returned.
    pub items_seen: usize,
    /// Items skipped because their domain is excluded.
    pub excluded: usize,
    /// Items skipped because they are already recorded.
    pub duplicates: usize,
    /// Items skipped because no hostname could be parsed.
    pub unparseable: usize,
    /// Pages fetched and classified.
    pub fetched: usize,
    /// Opportunities recorded.
    pub findings: usize,
    /// Opportunities found but not recorded because the store rejected them.
    #[serde(default)]
    pub write_failures: usize,
    /// Why pagination stopped.
    pub stop: StopReason,
}

impl QueryReport {
    /// Creates an empty report for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Counts a filter decision.
    pub fn record_decision(&mut self, decision: &FilterDecision) {
        match decision {
            FilterDecision::Accept => self.fetched += 1,
            FilterDecision::Unparseable => self.unparseable += 1,
            FilterDecision::Excluded(_) => self.excluded += 1,
            FilterDecision::Duplicate => self.duplicates += 1,
        }
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-query reports, in processing order.
    pub queries: Vec<QueryReport>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    /// Starts a report now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: generate_run_id(),
            started_at: now_utc(),
            finished_at: None,
            queries: Vec::new(),
        }
    }

    /// Marks the run as finished now.
    pub fn finish(&mut self) {
        self.finished_at = Some(now_utc());
    }

    /// Total page requests.
    #[must_use]
    pub fn pages_requested(&self) -> usize {
        self.queries.iter().map(|q| q.pages_requested).sum()
    }

    /// Total pages fetched and classified.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.queries.iter().map(|q| q.fetched).sum()
    }

    /// Total opportunities recorded.
    #[must_use]
    pub fn findings(&self) -> usize {
        self.queries.iter().map(|q| q.findings).sum()
    }

    /// Opportunities the store rejected.
    #[must_use]
    pub fn write_failures(&self) -> usize {
        self.queries.iter().map(|q| q.write_failures).sum()
    }

    /// Queries whose pagination ended on a failed request.
    #[must_use]
    pub fn failed_queries(&self) -> Vec<&str> {
        self.queries
            .iter()
            .filter(|q| matches!(q.stop, StopReason::Failed(_)))
            .map(|q| q.query.as_str())
            .collect()
    }
}
