//! The discovery run: paginate, filter, classify, record.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::report::{QueryReport, RunReport, StopReason};
use crate::config::ScoutConfig;
use crate::core::{Query, RunStatus};
use crate::discovery::{
    evaluate_url, ExclusionList, FilterDecision, KnownUrls, MentionClassifier, PageFetcher,
    SearchPage, SearchProvider,
};
use crate::errors::{MentionScoutError, Result};
use crate::store::{opportunity_to_record, query_from_record, Record, TabularStore};
use crate::utils::{format_iso8601, now_utc};

/// Exclusions and already-recorded URLs for the duration of one run.
///
/// The URL set is loaded once and then kept current as opportunities are
/// appended, so a page surfaced by two queries is only recorded once.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Domains never fetched.
    pub exclusions: ExclusionList,
    /// Active and archived opportunity URLs.
    pub known: KnownUrls,
}

/// Drives discovery runs against a record store.
#[derive(Clone)]
pub struct MentionScout {
    config: ScoutConfig,
    search: Arc<dyn SearchProvider>,
    classifier: MentionClassifier,
    store: Arc<dyn TabularStore>,
}

impl std::fmt::Debug for MentionScout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionScout")
            .field("config", &self.config)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl MentionScout {
    /// Creates a runner. Fails with a configuration error before any network
    /// call if credentials or brand settings are missing.
    pub fn new(
        config: ScoutConfig,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn TabularStore>,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = MentionClassifier::new(&config.brand, fetcher)?;
        Ok(Self {
            config,
            search,
            classifier,
            store,
        })
    }

    /// Creates a runner wired to the HTTP search client and page fetcher,
    /// counting search calls in `properties`.
    #[cfg(feature = "http")]
    pub fn from_config(
        config: ScoutConfig,
        store: Arc<dyn TabularStore>,
        properties: Arc<dyn crate::store::KeyValueStore>,
    ) -> Result<Self> {
        use crate::discovery::{CustomSearchClient, HttpPageFetcher};
        use crate::quota::QuotaTracker;

        config.validate()?;
        let quota = QuotaTracker::new(properties)
            .with_display(store.clone(), config.layout.quota_counter_location.clone());
        let search = CustomSearchClient::new(config.search.clone())?.with_quota(quota);
        let fetcher = HttpPageFetcher::new(config.fetch.clone())?;
        Self::new(config, Arc::new(search), Arc::new(fetcher), store)
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Reads the exclusion list and the active and archived URL sets.
    pub async fn load_context(&self) -> Result<RunContext> {
        let layout = &self.config.layout;
        let exclusions = self
            .store
            .read_scalar(&layout.exclusions_location)
            .await?
            .map(|raw| ExclusionList::parse(&raw))
            .unwrap_or_default();
        let active = self.store.read_all(&layout.active_collection).await?;
        let archived = self.store.read_all(&layout.archive_collection).await?;

        Ok(RunContext {
            exclusions,
            known: KnownUrls::from_records(&active, &archived),
        })
    }

    /// Runs `queries` in order, paginating each up to `max_pages_per_query`.
    ///
    /// Blank queries are skipped. Every processed query gets its
    /// `last_checked_at` stamped. Failing to load exclusions or known URLs
    /// aborts the run; a failed append only skips that URL.
    pub async fn run(
        &self,
        queries: &mut [Query],
        max_pages_per_query: usize,
    ) -> Result<RunReport> {
        let mut ctx = self.load_context().await?;
        let mut report = RunReport::new();

        for query in queries.iter_mut().filter(|q| !q.is_blank()) {
            let query_report = self.run_query(&query.text, max_pages_per_query, &mut ctx).await;
            query.mark_checked(now_utc());
            report.queries.push(query_report);
        }

        report.finish();
        Ok(report)
    }

    /// The scheduled entry point: reads queries from the store, runs them
    /// with the configured page budget, and keeps the status location
    /// current throughout.
    ///
    /// On error the status reads `Error! ...` and the cause is returned
    /// wrapped as [`MentionScoutError::Fatal`].
    pub async fn run_scheduled(&self) -> Result<RunReport> {
        self.set_status(&RunStatus::Running).await;

        match self.run_from_store().await {
            Ok(report) => {
                let finished_at = report.finished_at.unwrap_or_else(now_utc);
                self.set_status(&RunStatus::Complete { finished_at }).await;
                info!(
                    run_id = %report.run_id,
                    queries = report.queries.len(),
                    pages = report.pages_requested(),
                    fetched = report.fetched(),
                    findings = report.findings(),
                    write_failures = report.write_failures(),
                    "Discovery run complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Discovery run aborted");
                self.set_status(&RunStatus::Error {
                    message: e.to_string(),
                })
                .await;
                Err(MentionScoutError::fatal(e))
            }
        }
    }

    async fn run_from_store(&self) -> Result<RunReport> {
        let layout = &self.config.layout;
        let rows = self.store.read_all(&layout.queries_collection).await?;
        let mut ctx = self.load_context().await?;
        let mut report = RunReport::new();
        let max_pages = self.config.search.pages_per_query;

        for (index, row) in rows.into_iter().enumerate() {
            let query = query_from_record(&row);
            if query.is_blank() {
                continue;
            }

            self.set_status(&RunStatus::Searching {
                query: query.text.clone(),
            })
            .await;

            let query_report = self.run_query(&query.text, max_pages, &mut ctx).await;
            report.queries.push(query_report);

            let stamped = stamp_checked(row, &format_iso8601(&now_utc()));
            self.store
                .update_row(&layout.queries_collection, index, stamped)
                .await?;
        }

        report.finish();
        Ok(report)
    }

    /// Paginates one query and processes every surfaced URL.
    #[instrument(skip(self, ctx))]
    pub async fn run_query(
        &self,
        query: &str,
        max_pages: usize,
        ctx: &mut RunContext,
    ) -> QueryReport {
        let mut report = QueryReport::new(query);

        for page in 0..max_pages {
            let start_index = self.config.search.start_index(page);
            report.pages_requested += 1;

            let items = match self.search.fetch_page(query, start_index).await {
                SearchPage::Items(items) => items,
                SearchPage::Exhausted => {
                    report.stop = StopReason::Exhausted;
                    break;
                }
                SearchPage::Failed(reason) => {
                    warn!(start_index, reason = %reason, "Search page failed, moving on");
                    report.stop = StopReason::Failed(reason);
                    break;
                }
            };

            report.items_seen += items.len();
            for item in items {
                self.process_url(&item.url, ctx, &mut report).await;
            }
        }

        info!(
            pages = report.pages_requested,
            fetched = report.fetched,
            findings = report.findings,
            stop = %report.stop,
            "Query processed"
        );
        report
    }

    /// Filters, classifies and records one URL. A failed append is logged
    /// and counted; the URL stays unknown so a later query may retry it.
    async fn process_url(&self, url: &str, ctx: &mut RunContext, report: &mut QueryReport) {
        let decision = evaluate_url(url, &ctx.exclusions, &ctx.known);
        report.record_decision(&decision);
        if decision != FilterDecision::Accept {
            return;
        }

        let Some(opportunity) = self.classifier.classify(url).await else {
            return;
        };
        let appended = self
            .store
            .append(
                &self.config.layout.active_collection,
                opportunity_to_record(&opportunity),
            )
            .await;

        match appended {
            Ok(()) => {
                ctx.known.insert(opportunity.url);
                report.findings += 1;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to record opportunity, moving on");
                report.write_failures += 1;
            }
        }
    }

    async fn set_status(&self, status: &RunStatus) {
        let location = &self.config.layout.status_location;
        if let Err(e) = self.store.write_scalar(location, &status.to_string()).await {
            warn!(error = %e, location = %location, "Failed to write run status");
        }
    }
}

/// Writes `checked_at` into the last-checked cell, keeping any extra cells.
fn stamp_checked(mut row: Record, checked_at: &str) -> Record {
    if row.len() < 2 {
        row.resize(2, String::new());
    }
    row[1] = checked_at.to_string();
    row
}
