//! End-to-end tests for discovery runs.

#[cfg(test)]
mod tests {
    use crate::config::{BrandConfig, ScoutConfig, StoreLayout};
    use crate::core::{Opportunity, OpportunityStatus, Query};
    use crate::discovery::{MockSearchProvider, SearchPage, SearchResultItem};
    use crate::errors::{MentionScoutError, Result};
    use crate::pipeline::{MentionScout, StopReason};
    use crate::quota::QuotaTracker;
    use crate::store::{opportunity_from_record, query_from_record, MemoryStore, Record, TabularStore};
    use crate::testing::{sample_config, ScriptedSearchProvider, StaticPageFetcher, StoreFixture};
    use crate::utils::{now_utc, today_utc};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const MENTION_HTML: &str = "<html><body><p>I bought shoes on Myntra last week.</p></body></html>";
    const LINKED_HTML: &str =
        r#"<html><body><p>Try <a href="https://www.myntra.com/shoes">Myntra</a>.</p></body></html>"#;

    /// A memory store that rejects its first `failing_appends` appends and,
    /// when `fail_updates` is set, every row update.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing_appends: AtomicUsize,
        fail_updates: bool,
    }

    impl FlakyStore {
        fn failing_appends(count: usize) -> Self {
            Self {
                failing_appends: AtomicUsize::new(count),
                ..Self::default()
            }
        }

        fn failing_updates() -> Self {
            Self {
                fail_updates: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl TabularStore for FlakyStore {
        async fn append(&self, collection: &str, record: Record) -> Result<()> {
            let reject = self
                .failing_appends
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if reject {
                return Err(MentionScoutError::store("sheet is protected"));
            }
            self.inner.append(collection, record).await
        }

        async fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
            self.inner.read_all(collection).await
        }

        async fn update_row(&self, collection: &str, index: usize, record: Record) -> Result<()> {
            if self.fail_updates {
                return Err(MentionScoutError::store("query sheet is protected"));
            }
            self.inner.update_row(collection, index, record).await
        }

        async fn delete_row(&self, collection: &str, index: usize) -> Result<Record> {
            self.inner.delete_row(collection, index).await
        }

        async fn read_scalar(&self, location: &str) -> Result<Option<String>> {
            self.inner.read_scalar(location).await
        }

        async fn write_scalar(&self, location: &str, value: &str) -> Result<()> {
            self.inner.write_scalar(location, value).await
        }
    }

    fn scout(
        search: Arc<ScriptedSearchProvider>,
        fetcher: Arc<StaticPageFetcher>,
        store: Arc<dyn TabularStore>,
    ) -> MentionScout {
        MentionScout::new(sample_config(), search, fetcher, store).unwrap()
    }

    fn active_rows(store: &MemoryStore) -> Vec<Record> {
        store
            .snapshot()
            .collections
            .get(&StoreLayout::default().active_collection)
            .cloned()
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_excluded_domain_is_never_fetched() {
        let layout = StoreLayout::default();
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_urls("Myntra reviews", &["https://foo.com/a", "https://bar.com/b"]),
        );
        let fetcher = Arc::new(StaticPageFetcher::new().with_html("https://bar.com/b", MENTION_HTML));
        let store = Arc::new(StoreFixture::new().with_exclusions("foo.com").build());

        let mut queries = vec![Query::new("Myntra reviews")];
        let report = scout(search.clone(), fetcher.clone(), store.clone())
            .run(&mut queries, 3)
            .await
            .unwrap();

        assert_eq!(fetcher.fetched(), vec!["https://bar.com/b".to_string()]);
        assert_eq!(
            search.calls(),
            vec![("Myntra reviews".to_string(), 1), ("Myntra reviews".to_string(), 11)]
        );

        let rows = active_rows(&store);
        assert_eq!(rows.len(), 1);
        let found = opportunity_from_record(&rows[0]).unwrap();
        assert_eq!(found.url, "https://bar.com/b");
        assert_eq!(found.status, OpportunityStatus::New);
        assert!(found.context_snippet.contains("Myntra"));
        assert_eq!(store.row_count(&layout.archive_collection), 0);

        let q = &report.queries[0];
        assert_eq!(q.excluded, 1);
        assert_eq!(q.fetched, 1);
        assert_eq!(q.findings, 1);
        assert_eq!(q.stop, StopReason::Exhausted);
        assert!(queries[0].last_checked_at.is_some());
    }

    #[tokio::test]
    async fn test_linked_and_unmentioned_pages_are_not_recorded() {
        let search = Arc::new(ScriptedSearchProvider::new().with_urls(
            "q",
            &["https://a.com/linked", "https://b.com/silent", "https://c.com/down"],
        ));
        let fetcher = Arc::new(
            StaticPageFetcher::new()
                .with_html("https://a.com/linked", LINKED_HTML)
                .with_html("https://b.com/silent", "<p>Nothing to see</p>"),
        );
        let store = Arc::new(MemoryStore::new());

        let report = scout(search, fetcher.clone(), store.clone())
            .run(&mut [Query::new("q")], 3)
            .await
            .unwrap();

        assert_eq!(fetcher.fetched().len(), 3);
        assert_eq!(report.findings(), 0);
        assert!(active_rows(&store).is_empty());
    }

    #[tokio::test]
    async fn test_page_budget_caps_requests() {
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_urls("q", &["https://a.com/1"])
                .with_urls("q", &["https://a.com/2"])
                .with_urls("q", &["https://a.com/3"])
                .with_urls("q", &["https://a.com/4"]),
        );
        let fetcher = Arc::new(StaticPageFetcher::new());
        let store = Arc::new(MemoryStore::new());

        let report = scout(search.clone(), fetcher, store)
            .run(&mut [Query::new("q")], 3)
            .await
            .unwrap();

        let starts: Vec<usize> = search.calls().into_iter().map(|(_, s)| s).collect();
        assert_eq!(starts, vec![1, 11, 21]);
        assert_eq!(report.queries[0].stop, StopReason::PageLimit);
        assert_eq!(report.queries[0].items_seen, 3);
    }

    #[tokio::test]
    async fn test_failed_page_ends_query_but_not_run() {
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_page("broken", SearchPage::Failed("HTTP 500".into()))
                .with_urls("fine", &["https://bar.com/b"]),
        );
        let fetcher = Arc::new(StaticPageFetcher::new().with_html("https://bar.com/b", MENTION_HTML));
        let store = Arc::new(MemoryStore::new());

        let mut queries = vec![Query::new("broken"), Query::new("fine")];
        let report = scout(search.clone(), fetcher, store.clone())
            .run(&mut queries, 3)
            .await
            .unwrap();

        assert_eq!(report.queries[0].pages_requested, 1);
        assert_eq!(report.queries[0].stop, StopReason::Failed("HTTP 500".into()));
        assert_eq!(report.failed_queries(), vec!["broken"]);
        assert_eq!(report.findings(), 1);
        assert!(queries.iter().all(|q| q.last_checked_at.is_some()));
    }

    #[tokio::test]
    async fn test_url_found_twice_in_a_run_is_recorded_once() {
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_urls("first", &["https://bar.com/b"])
                .with_urls("second", &["https://bar.com/b", "https://bar.com/c"]),
        );
        let fetcher = Arc::new(
            StaticPageFetcher::new()
                .with_html("https://bar.com/b", MENTION_HTML)
                .with_html("https://bar.com/c", MENTION_HTML),
        );
        let store = Arc::new(MemoryStore::new());

        let report = scout(search, fetcher.clone(), store.clone())
            .run(&mut [Query::new("first"), Query::new("second")], 3)
            .await
            .unwrap();

        assert_eq!(
            fetcher.fetched(),
            vec!["https://bar.com/b".to_string(), "https://bar.com/c".to_string()]
        );
        assert_eq!(report.queries[1].duplicates, 1);
        assert_eq!(active_rows(&store).len(), 2);
    }

    #[tokio::test]
    async fn test_archived_and_active_urls_are_skipped() {
        let known_active = Opportunity::new("https://a.com/x", "ctx", now_utc());
        let known_archived = Opportunity::new("https://b.com/y", "ctx", now_utc())
            .with_status(OpportunityStatus::Contacted);
        let search = Arc::new(
            ScriptedSearchProvider::new().with_urls("q", &["https://a.com/x", "https://b.com/y"]),
        );
        let fetcher = Arc::new(StaticPageFetcher::new());
        let store = Arc::new(
            StoreFixture::new()
                .with_active(&known_active)
                .with_archived(&known_archived)
                .build(),
        );

        let report = scout(search, fetcher.clone(), store.clone())
            .run(&mut [Query::new("q")], 3)
            .await
            .unwrap();

        assert!(fetcher.fetched().is_empty());
        assert_eq!(report.queries[0].duplicates, 2);
        assert_eq!(active_rows(&store).len(), 1);
    }

    #[tokio::test]
    async fn test_blank_queries_are_skipped() {
        let search = Arc::new(ScriptedSearchProvider::new());
        let store = Arc::new(MemoryStore::new());

        let mut queries = vec![Query::new("   "), Query::new("real")];
        let report = scout(search.clone(), Arc::new(StaticPageFetcher::new()), store)
            .run(&mut queries, 3)
            .await
            .unwrap();

        assert_eq!(report.queries.len(), 1);
        assert_eq!(search.calls(), vec![("real".to_string(), 1)]);
        assert!(queries[0].last_checked_at.is_none());
    }

    #[tokio::test]
    async fn test_search_calls_are_counted_against_quota() {
        let properties = Arc::new(MemoryStore::new());
        let quota = QuotaTracker::new(properties.clone());
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_urls("q", &["https://a.com/1"])
                .with_quota(quota.clone()),
        );
        let store = Arc::new(MemoryStore::new());

        scout(search, Arc::new(StaticPageFetcher::new()), store)
            .run(&mut [Query::new("q")], 3)
            .await
            .unwrap();

        assert_eq!(quota.current().await.count_on(today_utc()), 2);
    }

    #[tokio::test]
    async fn test_scheduled_run_updates_status_and_queries() {
        let layout = StoreLayout::default();
        let search = Arc::new(
            ScriptedSearchProvider::new().with_urls("Myntra reviews", &["https://bar.com/b"]),
        );
        let fetcher = Arc::new(StaticPageFetcher::new().with_html("https://bar.com/b", MENTION_HTML));
        let store = Arc::new(
            StoreFixture::new()
                .with_query(Query::new("Myntra reviews"))
                .with_query(Query::new(""))
                .build(),
        );

        let report = scout(search, fetcher, store.clone())
            .run_scheduled()
            .await
            .unwrap();
        assert_eq!(report.findings(), 1);

        let status = store.read_scalar(&layout.status_location).await.unwrap().unwrap();
        assert!(status.starts_with("Complete. Last run: "), "{status}");

        let rows = store.read_all(&layout.queries_collection).await.unwrap();
        assert!(query_from_record(&rows[0]).last_checked_at.is_some());
        assert!(query_from_record(&rows[1]).last_checked_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_append_skips_only_that_url() {
        let layout = StoreLayout::default();
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_urls("q1", &["https://a.com/1", "https://b.com/2"])
                .with_urls("q2", &["https://c.com/3"]),
        );
        let fetcher = Arc::new(
            StaticPageFetcher::new()
                .with_html("https://a.com/1", MENTION_HTML)
                .with_html("https://b.com/2", MENTION_HTML)
                .with_html("https://c.com/3", MENTION_HTML),
        );
        let store = Arc::new(FlakyStore::failing_appends(1));

        let mut queries = vec![Query::new("q1"), Query::new("q2")];
        let report = scout(search.clone(), fetcher.clone(), store.clone())
            .run(&mut queries, 3)
            .await
            .unwrap();

        assert_eq!(
            fetcher.fetched(),
            vec![
                "https://a.com/1".to_string(),
                "https://b.com/2".to_string(),
                "https://c.com/3".to_string()
            ]
        );
        assert!(search.calls().iter().any(|(q, _)| q == "q2"));

        let urls: Vec<String> = store
            .read_all(&layout.active_collection)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row[0].clone())
            .collect();
        assert_eq!(urls, vec!["https://b.com/2".to_string(), "https://c.com/3".to_string()]);
        assert_eq!(report.findings(), 2);
        assert_eq!(report.write_failures(), 1);
        assert_eq!(report.queries[0].write_failures, 1);
        assert!(queries.iter().all(|q| q.last_checked_at.is_some()));
    }

    #[tokio::test]
    async fn test_query_stamp_failure_aborts_run_with_error_status() {
        let layout = StoreLayout::default();
        let search = Arc::new(
            ScriptedSearchProvider::new()
                .with_urls("first", &["https://bar.com/b"])
                .with_urls("second", &["https://bar.com/c"]),
        );
        let fetcher = Arc::new(StaticPageFetcher::new().with_html("https://bar.com/b", MENTION_HTML));
        let store = Arc::new(FlakyStore::failing_updates());
        for text in ["first", "second"] {
            store
                .inner
                .append(&layout.queries_collection, vec![text.into(), String::new()])
                .await
                .unwrap();
        }

        let err = scout(search.clone(), fetcher, store.clone())
            .run_scheduled()
            .await
            .unwrap_err();

        assert!(
            matches!(err, MentionScoutError::Fatal(ref cause) if matches!(**cause, MentionScoutError::Store(_)))
        );
        assert!(search.calls().iter().all(|(q, _)| q == "first"));
        assert_eq!(store.inner.row_count(&layout.active_collection), 1);
        let status = store.read_scalar(&layout.status_location).await.unwrap().unwrap();
        assert_eq!(status, "Error! Check logs. Message: Store error: query sheet is protected");
    }

    #[test]
    fn test_placeholder_credentials_fail_before_any_call() {
        let config = ScoutConfig::new(BrandConfig::new("Myntra", "myntra.com"));
        let search = Arc::new(ScriptedSearchProvider::new());

        let err = MentionScout::new(
            config,
            search.clone(),
            Arc::new(StaticPageFetcher::new()),
            Arc::new(MemoryStore::new()),
        )
        .unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_sees_one_based_offsets() {
        let mut search = MockSearchProvider::new();
        search
            .expect_fetch_page()
            .withf(|query, start| query == "q" && *start == 1)
            .times(1)
            .returning(|_, _| SearchPage::Items(vec![SearchResultItem::new("https://bar.com/b")]));
        search
            .expect_fetch_page()
            .withf(|_, start| *start == 11)
            .times(1)
            .returning(|_, _| SearchPage::Exhausted);

        let fetcher = Arc::new(StaticPageFetcher::new().with_html("https://bar.com/b", MENTION_HTML));
        let scout = MentionScout::new(
            sample_config(),
            Arc::new(search),
            fetcher,
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        let report = scout.run(&mut [Query::new("q")], 5).await.unwrap();
        assert_eq!(report.pages_requested(), 2);
        assert_eq!(report.findings(), 1);
    }
}
