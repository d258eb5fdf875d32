//! HTTP page fetcher.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client};
use tracing::debug;

use super::protocols::{FetchResult, PageFetcher};
use crate::config::FetchConfig;
use crate::errors::{MentionScoutError, Result};

/// Fetches candidate pages with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpPageFetcher {
    /// Creates a fetcher. Invalid extra headers are configuration errors.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| MentionScoutError::configuration(format!("header {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| MentionScoutError::configuration(format!("header {key}: {e}")))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout()?)
            .build()
            .map_err(|e| MentionScoutError::configuration(format!("page HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let mut response = self.http.get(url).send().await?;
        let status_code = response.status().as_u16();

        let cap = self.config.max_page_bytes;
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = cap - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(url = %url, cap, "Page body truncated at size cap");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResult::new(
            status_code,
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }
}
