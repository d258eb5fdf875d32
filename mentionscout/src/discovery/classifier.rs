//! Unlinked-mention detection.
//!
//! A page is an opportunity when it names the brand (case-insensitively)
//! and contains no `href` pointing at the brand domain. Matching runs on the
//! raw HTML; nothing is rendered.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use super::protocols::PageFetcher;
use crate::config::BrandConfig;
use crate::core::Opportunity;
use crate::errors::{MentionScoutError, Result};
use crate::utils::now_utc;

/// Characters kept on each side of the first mention.
pub const SNIPPET_RADIUS: usize = 75;

#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

#[allow(clippy::expect_used)]
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Result of inspecting page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The brand name occurs in the content.
    pub mentioned: bool,
    /// The content links to the brand domain.
    pub linked: bool,
}

impl Detection {
    /// A mention without a link.
    #[must_use]
    pub fn is_opportunity(&self) -> bool {
        self.mentioned && !self.linked
    }
}

/// Pure content heuristics for one brand.
#[derive(Debug, Clone)]
pub struct MentionDetector {
    mention: Regex,
    link: Regex,
}

impl MentionDetector {
    /// Compiles the patterns for `brand`.
    pub fn new(brand: &BrandConfig) -> Result<Self> {
        let name = brand.name.trim();
        let domain = brand.domain.trim().to_lowercase();
        if name.is_empty() || domain.is_empty() {
            return Err(MentionScoutError::configuration(
                "brand name and domain must be set",
            ));
        }

        let mention = Regex::new(&format!("(?i){}", regex::escape(name)))
            .map_err(|e| MentionScoutError::configuration(format!("brand pattern: {e}")))?;
        let link = Regex::new(&format!(
            r#"(?i)href\s*=\s*["'](https?://)?(www\.)?{}"#,
            regex::escape(&domain)
        ))
        .map_err(|e| MentionScoutError::configuration(format!("link pattern: {e}")))?;

        Ok(Self { mention, link })
    }

    /// Whether the content names the brand, ignoring case.
    #[must_use]
    pub fn is_mentioned(&self, content: &str) -> bool {
        self.mention.is_match(content)
    }

    /// Whether the content has an `href` to the brand domain, with or
    /// without scheme and `www.`, in single or double quotes.
    #[must_use]
    pub fn is_linked(&self, content: &str) -> bool {
        self.link.is_match(content)
    }

    /// Runs both checks.
    #[must_use]
    pub fn detect(&self, content: &str) -> Detection {
        Detection {
            mentioned: self.is_mentioned(content),
            linked: self.is_linked(content),
        }
    }

    /// Context snippet around the first mention, if there is one.
    ///
    /// Takes [`SNIPPET_RADIUS`] characters either side of the match, replaces
    /// tags with spaces, collapses whitespace, trims, and wraps the result
    /// in `...`.
    #[must_use]
    pub fn snippet(&self, content: &str) -> Option<String> {
        let found = self.mention.find(content)?;

        let start = content[..found.start()]
            .char_indices()
            .rev()
            .nth(SNIPPET_RADIUS - 1)
            .map_or(0, |(idx, _)| idx);
        let end = content[found.end()..]
            .char_indices()
            .nth(SNIPPET_RADIUS)
            .map_or(content.len(), |(idx, _)| found.end() + idx);

        Some(format!("...{}...", clean_fragment(&content[start..end])))
    }

    /// The snippet if the content is an unlinked mention, `None` otherwise.
    #[must_use]
    pub fn analyze(&self, content: &str) -> Option<String> {
        if self.detect(content).is_opportunity() {
            self.snippet(content)
        } else {
            None
        }
    }
}

/// Strips tags and collapses whitespace.
#[must_use]
pub fn clean_fragment(raw: &str) -> String {
    let untagged = TAG_RE.replace_all(raw, " ");
    WHITESPACE_RE.replace_all(&untagged, " ").trim().to_string()
}

/// Fetches candidate pages and turns unlinked mentions into opportunities.
#[derive(Clone)]
pub struct MentionClassifier {
    detector: MentionDetector,
    fetcher: Arc<dyn PageFetcher>,
}

impl std::fmt::Debug for MentionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionClassifier")
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl MentionClassifier {
    /// Creates a classifier for `brand`.
    pub fn new(brand: &BrandConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            detector: MentionDetector::new(brand)?,
            fetcher,
        })
    }

    /// Gets the content heuristics.
    #[must_use]
    pub fn detector(&self) -> &MentionDetector {
        &self.detector
    }

    /// Fetches `url` and classifies it.
    ///
    /// Non-200 responses and fetch failures are logged and yield `None`.
    pub async fn classify(&self, url: &str) -> Option<Opportunity> {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch candidate page");
                return None;
            }
        };

        if !page.is_ok() {
            debug!(url = %url, status = page.status_code, "Could not fetch URL");
            return None;
        }

        let detection = self.detector.detect(&page.text);
        if !detection.is_opportunity() {
            debug!(
                url = %url,
                mentioned = detection.mentioned,
                linked = detection.linked,
                "Not an unlinked mention"
            );
            return None;
        }

        let snippet = self.detector.snippet(&page.text)?;
        info!(url = %url, "Found unlinked mention");
        Some(Opportunity::new(url, snippet, now_utc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OpportunityStatus;
    use crate::discovery::protocols::FetchResult;
    use crate::testing::StaticPageFetcher;
    use pretty_assertions::assert_eq;

    fn detector() -> MentionDetector {
        MentionDetector::new(&BrandConfig::new("Myntra", "myntra.com")).unwrap()
    }

    #[test]
    fn test_plain_mention_is_opportunity() {
        let d = detector().detect("Shop at MYNTRA today");
        assert_eq!(d, Detection { mentioned: true, linked: false });
        assert!(d.is_opportunity());
    }

    #[test]
    fn test_linked_mention_is_not_opportunity() {
        let d = detector().detect("<a href='https://www.myntra.com'>Myntra</a>");
        assert!(d.mentioned);
        assert!(d.linked);
        assert!(!d.is_opportunity());
    }

    #[test]
    fn test_link_variants() {
        let det = detector();
        for html in [
            r#"<a href="http://myntra.com/shoes">x</a>"#,
            r#"<a HREF = "https://WWW.MYNTRA.COM">x</a>"#,
            "<a href='myntra.com'>x</a>",
            r#"<a href="www.myntra.com/x">x</a>"#,
        ] {
            assert!(det.is_linked(html), "{html}");
        }
    }

    #[test]
    fn test_non_links_to_brand() {
        let det = detector();
        assert!(!det.is_linked("visit myntra.com for deals"));
        assert!(!det.is_linked(r#"<a href="https://myntraxcom.net">x</a>"#));
        assert!(!det.is_linked(r#"<a href="https://shop.myntra.com">x</a>"#));
        assert!(!det.is_linked(r#"<a href="https://example.com/?u=myntra.com">x</a>"#));
    }

    #[test]
    fn test_no_mention() {
        assert_eq!(detector().analyze("<p>Nothing to see</p>"), None);
    }

    #[test]
    fn test_snippet_short_content() {
        let snippet = detector().snippet("<p>I love   <b>Myntra</b>\n sales</p>").unwrap();
        assert_eq!(snippet, "...I love Myntra sales...");
    }

    #[test]
    fn test_snippet_window_is_bounded() {
        let before = "a".repeat(200);
        let after = "b".repeat(200);
        let content = format!("{before}myntra{after}");

        let snippet = detector().snippet(&content).unwrap();
        let inner = snippet.trim_start_matches("...").trim_end_matches("...");
        assert_eq!(inner, format!("{}myntra{}", "a".repeat(75), "b".repeat(75)));
    }

    #[test]
    fn test_snippet_uses_first_mention_and_original_case() {
        let content = "First MyNtRa here. Later Myntra again.";
        let snippet = detector().snippet(content).unwrap();
        assert!(snippet.contains("First MyNtRa here"));
        assert!(snippet.starts_with("...") && snippet.ends_with("..."));
    }

    #[test]
    fn test_snippet_multibyte_boundaries() {
        let content = format!("{}Myntra{}", "é".repeat(100), "ü".repeat(100));
        let snippet = detector().snippet(&content).unwrap();
        let inner = snippet.trim_start_matches("...").trim_end_matches("...");
        assert_eq!(inner.chars().count(), 75 + 6 + 75);
    }

    #[test]
    fn test_snippet_is_idempotent() {
        let content = "<div>Great  deals on\tMyntra <span>this week</span></div>";
        let det = detector();
        assert_eq!(det.snippet(content), det.snippet(content));
    }

    #[test]
    fn test_clean_fragment() {
        assert_eq!(clean_fragment("  <a\nhref='x'>one</a>\t\ttwo  "), "one two");
        assert_eq!(clean_fragment("ref=\"x\">tail"), "ref=\"x\">tail");
    }

    #[test]
    fn test_detector_rejects_empty_brand() {
        let err = MentionDetector::new(&BrandConfig::new("", "myntra.com")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_brand_with_regex_metacharacters() {
        let det = MentionDetector::new(&BrandConfig::new("C++ (Shop)", "c-shop.io")).unwrap();
        assert!(det.is_mentioned("we like c++ (shop) a lot"));
        assert!(!det.is_linked(r#"<a href="https://cxshop.io">"#));
        assert!(det.is_linked(r#"<a href="https://c-shop.io">"#));
    }

    #[tokio::test]
    async fn test_classify_positive() {
        let fetcher = StaticPageFetcher::new()
            .with_page("https://bar.com/b", FetchResult::new(200, "<p>Reviews of Myntra</p>"));
        let classifier = MentionClassifier::new(
            &BrandConfig::new("Myntra", "myntra.com"),
            Arc::new(fetcher),
        )
        .unwrap();

        let opp = classifier.classify("https://bar.com/b").await.unwrap();
        assert_eq!(opp.url, "https://bar.com/b");
        assert_eq!(opp.context_snippet, "...Reviews of Myntra...");
        assert_eq!(opp.status, OpportunityStatus::New);
    }

    #[tokio::test]
    async fn test_classify_non_200_and_failures() {
        let fetcher = StaticPageFetcher::new()
            .with_page("https://a.com", FetchResult::new(403, "Myntra"))
            .with_page(
                "https://b.com",
                FetchResult::new(200, r#"Myntra <a href="https://myntra.com">shop</a>"#),
            );
        let classifier = MentionClassifier::new(
            &BrandConfig::new("Myntra", "myntra.com"),
            Arc::new(fetcher),
        )
        .unwrap();

        assert!(classifier.classify("https://a.com").await.is_none());
        assert!(classifier.classify("https://b.com").await.is_none());
        assert!(classifier.classify("https://unknown.com").await.is_none());
    }
}
