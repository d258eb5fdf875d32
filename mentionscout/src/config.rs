//! Configuration types for discovery runs.
//!
//! Everything the pipeline needs to know (credentials, brand, fetch
//! behaviour, where things live in the store) is carried by [`ScoutConfig`]
//! and handed to the runner at construction time.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::errors::{MentionScoutError, Result};

/// Placeholder shipped in templates in place of a real API key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_GOOGLE_CSE_API_KEY_HERE";

/// Placeholder shipped in templates in place of a real engine id.
pub const ENGINE_ID_PLACEHOLDER: &str = "YOUR_CSE_ID_HERE";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MENTIONSCOUT_";

/// The brand being tracked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandConfig {
    /// Brand name as it appears in prose (matched case-insensitively).
    pub name: String,
    /// Brand domain without scheme or `www.`, e.g. `myntra.com`.
    pub domain: String,
}

impl BrandConfig {
    /// Creates a brand configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }
}

/// Retry configuration for failed search requests.
///
/// The default performs no retries: a failed page ends pagination for that
/// query just like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    #[serde(default)]
    pub max_retries: usize,
    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
}

fn default_retry_delay() -> f64 {
    1.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    30.0
}

fn default_retry_status_codes() -> HashSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_seconds: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl RetryConfig {
    /// Calculates the delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.retry_delay_seconds * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay.min(self.max_delay_seconds).max(0.0)).unwrap_or_default()
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// Search API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Search engine identifier (`cx`).
    #[serde(default)]
    pub engine_id: String,
    /// Endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Results returned per page by the API.
    #[serde(default = "default_results_per_page")]
    pub results_per_page: usize,
    /// Maximum pages requested per query.
    #[serde(default = "default_pages_per_query")]
    pub pages_per_query: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_results_per_page() -> usize {
    10
}

fn default_pages_per_query() -> usize {
    3
}

fn default_timeout() -> f64 {
    30.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            engine_id: String::new(),
            endpoint: default_endpoint(),
            results_per_page: default_results_per_page(),
            pages_per_query: default_pages_per_query(),
            timeout_seconds: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Creates a search configuration with credentials.
    #[must_use]
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            ..Self::default()
        }
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the page budget per query.
    #[must_use]
    pub fn with_pages_per_query(mut self, pages: usize) -> Self {
        self.pages_per_query = pages;
        self
    }

    /// Whether both credentials are present and not template placeholders.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        let key = self.api_key.trim();
        let cx = self.engine_id.trim();
        !key.is_empty() && !cx.is_empty() && key != API_KEY_PLACEHOLDER && cx != ENGINE_ID_PLACEHOLDER
    }

    /// 1-based start offset of a 0-based page number.
    #[must_use]
    pub fn start_index(&self, page: usize) -> usize {
        page * self.results_per_page + 1
    }

    /// Gets timeout as Duration. Fails unless it is positive and finite.
    pub fn timeout(&self) -> Result<Duration> {
        seconds_to_duration("search.timeout_seconds", self.timeout_seconds)
    }
}

/// Configuration for fetching candidate pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string. Identifies as a well-known crawler so fewer sites
    /// answer with 403.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bodies are read up to this many bytes; the rest is dropped.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_max_page_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_page_bytes: default_max_page_bytes(),
            headers: HashMap::new(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the body size cap.
    #[must_use]
    pub fn with_max_page_bytes(mut self, bytes: usize) -> Self {
        self.max_page_bytes = bytes;
        self
    }

    /// Gets timeout as Duration. Fails unless it is positive and finite.
    pub fn timeout(&self) -> Result<Duration> {
        seconds_to_duration("fetch.timeout_seconds", self.timeout_seconds)
    }
}

fn seconds_to_duration(field: &str, seconds: f64) -> Result<Duration> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(MentionScoutError::configuration(format!(
            "{field} must be a positive number of seconds, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| MentionScoutError::configuration(format!("{field}: {e}")))
}

/// Where each collection and scalar lives in the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreLayout {
    /// Collection of search queries.
    #[serde(default = "default_queries_collection")]
    pub queries_collection: String,
    /// Collection of active (status `New`) opportunities.
    #[serde(default = "default_active_collection")]
    pub active_collection: String,
    /// Collection of archived opportunities.
    #[serde(default = "default_archive_collection")]
    pub archive_collection: String,
    /// Scalar holding the operator-facing run status.
    #[serde(default = "default_status_location")]
    pub status_location: String,
    /// Scalar mirroring today's search-call count.
    #[serde(default = "default_quota_location")]
    pub quota_counter_location: String,
    /// Scalar holding the comma-separated exclusion list.
    #[serde(default = "default_exclusions_location")]
    pub exclusions_location: String,
}

fn default_queries_collection() -> String {
    "Queries".to_string()
}

fn default_active_collection() -> String {
    "Results - New".to_string()
}

fn default_archive_collection() -> String {
    "Archive".to_string()
}

fn default_status_location() -> String {
    "Dashboard & Controls!A3".to_string()
}

fn default_quota_location() -> String {
    "Dashboard & Controls!C3".to_string()
}

fn default_exclusions_location() -> String {
    "Dashboard & Controls!E3".to_string()
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            queries_collection: default_queries_collection(),
            active_collection: default_active_collection(),
            archive_collection: default_archive_collection(),
            status_location: default_status_location(),
            quota_counter_location: default_quota_location(),
            exclusions_location: default_exclusions_location(),
        }
    }
}

/// Combined configuration for a discovery run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Brand being tracked.
    #[serde(default)]
    pub brand: BrandConfig,
    /// Search API configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Page fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Store layout.
    #[serde(default)]
    pub layout: StoreLayout,
}

impl ScoutConfig {
    /// Creates a configuration for a brand with default everything else.
    #[must_use]
    pub fn new(brand: BrandConfig) -> Self {
        Self {
            brand,
            ..Self::default()
        }
    }

    /// Sets the search configuration.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Sets the store layout.
    #[must_use]
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Applies `MENTIONSCOUT_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `MENTIONSCOUT_*` overrides from an arbitrary lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("BRAND_NAME") {
            self.brand.name = v;
        }
        if let Some(v) = get("BRAND_DOMAIN") {
            self.brand.domain = v;
        }
        if let Some(v) = get("SEARCH_API_KEY") {
            self.search.api_key = v;
        }
        if let Some(v) = get("SEARCH_ENGINE_ID") {
            self.search.engine_id = v;
        }
        if let Some(v) = get("SEARCH_ENDPOINT") {
            self.search.endpoint = v;
        }
        if let Some(v) = get("PAGES_PER_QUERY") {
            match v.parse() {
                Ok(pages) => self.search.pages_per_query = pages,
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid PAGES_PER_QUERY"),
            }
        }
        if let Some(v) = get("USER_AGENT") {
            self.fetch.user_agent = v;
        }
        self
    }

    /// Checks that a run can start.
    pub fn validate(&self) -> Result<()> {
        if !self.search.has_credentials() {
            return Err(MentionScoutError::configuration(
                "search API key and engine id must be set",
            ));
        }
        if self.brand.name.trim().is_empty() {
            return Err(MentionScoutError::configuration("brand name must be set"));
        }
        if self.brand.domain.trim().is_empty() {
            return Err(MentionScoutError::configuration("brand domain must be set"));
        }
        if self.search.results_per_page == 0 {
            return Err(MentionScoutError::configuration(
                "results_per_page must be at least 1",
            ));
        }
        self.search.timeout()?;
        self.fetch.timeout()?;
        if self.fetch.max_page_bytes == 0 {
            return Err(MentionScoutError::configuration(
                "max_page_bytes must be at least 1",
            ));
        }
        let retry = &self.search.retry;
        for (field, value) in [
            ("retry_delay_seconds", retry.retry_delay_seconds),
            ("backoff_multiplier", retry.backoff_multiplier),
            ("max_delay_seconds", retry.max_delay_seconds),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MentionScoutError::configuration(format!(
                    "search.retry.{field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
