//! Daily search-API call counter.
//!
//! The counter lives in the durable key-value store so it survives between
//! runs, and is keyed by UTC calendar day. The day is looked up on every call
//! so a run crossing midnight starts a fresh count.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::{KeyValueStore, TabularStore};
use crate::utils::{format_day, parse_day, today_utc};

/// Property key holding the day the counter belongs to.
pub const LAST_QUERY_DATE_KEY: &str = "LAST_QUERY_DATE";

/// Property key holding the counter.
pub const DAILY_QUERY_COUNT_KEY: &str = "DAILY_QUERY_COUNT";

/// Persisted quota state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// Day the count belongs to, if any call was ever recorded.
    pub date: Option<NaiveDate>,
    /// Calls made on `date`.
    pub count: u64,
}

impl QuotaState {
    /// The count as seen on `today`: zero if the stored day is stale.
    #[must_use]
    pub fn count_on(&self, today: NaiveDate) -> u64 {
        if self.date == Some(today) {
            self.count
        } else {
            0
        }
    }
}

/// Tracks how many search calls were made today.
#[derive(Clone)]
pub struct QuotaTracker {
    properties: Arc<dyn KeyValueStore>,
    display: Option<(Arc<dyn TabularStore>, String)>,
}

impl std::fmt::Debug for QuotaTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaTracker")
            .field("display_location", &self.display.as_ref().map(|(_, loc)| loc))
            .finish_non_exhaustive()
    }
}

impl QuotaTracker {
    /// Creates a tracker persisting to `properties`.
    #[must_use]
    pub fn new(properties: Arc<dyn KeyValueStore>) -> Self {
        Self {
            properties,
            display: None,
        }
    }

    /// Mirrors every new count into a scalar location of `store`.
    #[must_use]
    pub fn with_display(mut self, store: Arc<dyn TabularStore>, location: impl Into<String>) -> Self {
        self.display = Some((store, location.into()));
        self
    }

    /// Records one search call made now.
    pub async fn record_call(&self) -> u64 {
        self.record_call_on(today_utc()).await
    }

    /// Records one search call made on `today` and returns the new count.
    ///
    /// Persistence failures are logged; the computed count is still returned.
    pub async fn record_call_on(&self, today: NaiveDate) -> u64 {
        let count = self.current().await.count_on(today) + 1;

        if let Err(e) = self.properties.set(LAST_QUERY_DATE_KEY, &format_day(today)).await {
            warn!(error = %e, "Failed to persist quota date");
        }
        if let Err(e) = self
            .properties
            .set(DAILY_QUERY_COUNT_KEY, &count.to_string())
            .await
        {
            warn!(error = %e, "Failed to persist quota count");
        }

        if let Some((store, location)) = &self.display {
            if let Err(e) = store.write_scalar(location, &count.to_string()).await {
                warn!(error = %e, location = %location, "Failed to update quota counter");
            }
        }

        debug!(count, day = %today, "Recorded search API call");
        count
    }

    /// Reads the persisted state. Missing or unreadable values read as empty.
    pub async fn current(&self) -> QuotaState {
        let date = match self.properties.get(LAST_QUERY_DATE_KEY).await {
            Ok(value) => value.and_then(|v| parse_day(&v).ok()),
            Err(e) => {
                warn!(error = %e, "Failed to read quota date");
                None
            }
        };
        let count = match self.properties.get(DAILY_QUERY_COUNT_KEY).await {
            Ok(value) => value.and_then(|v| v.trim().parse().ok()).unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "Failed to read quota count");
                0
            }
        };
        QuotaState { date, count }
    }
}
