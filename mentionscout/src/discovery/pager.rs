//! Search API client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, warn};

use super::models::{parse_search_response, SearchPage};
use super::protocols::SearchProvider;
use crate::config::SearchConfig;
use crate::errors::{MentionScoutError, Result};
use crate::quota::QuotaTracker;

/// Client for a Custom Search style JSON API.
///
/// Sends `key`, `cx`, `q` and a 1-based `start` offset; reads `items[].link`.
#[derive(Debug, Clone)]
pub struct CustomSearchClient {
    http: Client,
    config: SearchConfig,
    quota: Option<QuotaTracker>,
}

impl CustomSearchClient {
    /// Creates a client.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout()?)
            .build()
            .map_err(|e| MentionScoutError::configuration(format!("search HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            quota: None,
        })
    }

    /// Counts every successful call against the daily quota.
    #[must_use]
    pub fn with_quota(mut self, quota: QuotaTracker) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    async fn request_once(&self, query: &str, start_index: usize) -> Attempt {
        let start = start_index.to_string();
        let sent = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query),
                ("start", start.as_str()),
            ])
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(e.to_string()),
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Transport(e.to_string()),
        };

        if status == 200 {
            Attempt::Success(body)
        } else {
            Attempt::Status(status, body)
        }
    }
}

enum Attempt {
    Success(String),
    Status(u16, String),
    Transport(String),
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(300) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl SearchProvider for CustomSearchClient {
    async fn fetch_page(&self, query: &str, start_index: usize) -> SearchPage {
        if query.trim().is_empty() {
            return SearchPage::Failed("empty query".to_string());
        }
        if start_index == 0 {
            return SearchPage::Failed("start index must be at least 1".to_string());
        }
        if !self.config.has_credentials() {
            warn!("Search API key or engine id is not configured");
            return SearchPage::Failed("search credentials are not configured".to_string());
        }

        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            let started = Instant::now();
            let reason = match self.request_once(query, start_index).await {
                Attempt::Success(body) => {
                    if let Some(quota) = &self.quota {
                        quota.record_call().await;
                    }
                    return match parse_search_response(&body) {
                        Ok(page) => {
                            debug!(
                                query = %query,
                                start_index,
                                items = page.items().len(),
                                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                                "Search page fetched"
                            );
                            page
                        }
                        Err(e) => {
                            warn!(query = %query, start_index, error = %e, "Unparseable search response");
                            SearchPage::Failed(e.to_string())
                        }
                    };
                }
                Attempt::Status(status, body) => {
                    warn!(
                        query = %query,
                        start_index,
                        status,
                        body = %truncate_body(&body),
                        "Search API error"
                    );
                    if !retry.should_retry_status(status) {
                        return SearchPage::Failed(format!("HTTP {status}"));
                    }
                    format!("HTTP {status}")
                }
                Attempt::Transport(e) => {
                    warn!(query = %query, start_index, error = %e, "Search request failed");
                    e
                }
            };

            if attempt >= retry.max_retries {
                return SearchPage::Failed(reason);
            }
            let delay = retry.delay_for_attempt(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying search request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
