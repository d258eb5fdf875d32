//! Pre-fetch URL filtering: exclusion list and duplicate checks.

use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use url::Url;

use crate::store::{url_of_record, Record};

/// Operator-maintained set of domains whose pages are never fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    domains: HashSet<String>,
}

impl ExclusionList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list. Entries are trimmed and lowercased;
    /// empty entries are dropped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from_domains(raw.split(','))
    }

    /// Builds a list from individual domains.
    #[must_use]
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether `hostname` (already normalized) is excluded.
    #[must_use]
    pub fn contains(&self, hostname: &str) -> bool {
        self.domains.contains(hostname)
    }

    /// Number of excluded domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Returns true if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// URLs already recorded as active or archived opportunities.
///
/// Compared as exact strings: two URLs differing only in path are distinct.
#[derive(Debug, Clone, Default)]
pub struct KnownUrls {
    urls: HashSet<String>,
}

impl KnownUrls {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the union of the URL columns of the active and archived rows.
    #[must_use]
    pub fn from_records(active: &[Record], archived: &[Record]) -> Self {
        Self {
            urls: active
                .iter()
                .chain(archived)
                .filter_map(|r| url_of_record(r))
                .map(String::from)
                .collect(),
        }
    }

    /// Adds a URL. Returns false if it was already known.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    /// Whether `url` is already recorded.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Number of known URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if no URL is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownUrls {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            urls: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why a URL was accepted or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Fetch and classify the page.
    Accept,
    /// No hostname could be derived.
    Unparseable,
    /// The hostname is on the exclusion list.
    Excluded(String),
    /// The exact URL is already recorded.
    Duplicate,
}

impl FilterDecision {
    /// Returns true if the URL should be processed.
    #[must_use]
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Unparseable => write!(f, "unparseable"),
            Self::Excluded(host) => write!(f, "excluded ({host})"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Extracts the normalized hostname of a URL.
///
/// URLs with a scheme go through [`Url::parse`]; anything without `://` is
/// treated as a bare `host/path`. The host is lowercased, loses a trailing
/// `.` and one leading `www.`.
#[must_use]
pub fn extract_hostname(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let host = if trimmed.contains("://") {
        let parsed = Url::parse(trimmed).ok()?;
        parsed.host_str()?.to_string()
    } else {
        bare_host(trimmed)?.to_string()
    };

    let host = host.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Host of a scheme-less `host[:port]/path`, ignoring any userinfo.
fn bare_host(text: &str) -> Option<&str> {
    let authority = text.split('/').next()?;
    let host = authority.rsplit('@').next()?;
    host.split(':').next().map(str::trim)
}

/// Classifies a URL before any network fetch.
#[must_use]
pub fn evaluate_url(url: &str, exclusions: &ExclusionList, existing: &KnownUrls) -> FilterDecision {
    let Some(hostname) = extract_hostname(url) else {
        debug!(url = %url, "Could not parse domain from URL");
        return FilterDecision::Unparseable;
    };

    if exclusions.contains(&hostname) {
        debug!(url = %url, hostname = %hostname, "Skipping excluded domain");
        return FilterDecision::Excluded(hostname);
    }

    if existing.contains(url) {
        debug!(url = %url, "Skipping duplicate URL");
        return FilterDecision::Duplicate;
    }

    FilterDecision::Accept
}

/// Returns true only if the URL is neither excluded nor already recorded.
#[must_use]
pub fn should_process(url: &str, exclusions: &ExclusionList, existing: &KnownUrls) -> bool {
    evaluate_url(url, exclusions, existing).is_accept()
}
