//! Moving triaged opportunities out of the active collection.
//!
//! Operators triage opportunities by editing the status cell. Once a row
//! leaves `New` it is copied to the archive collection with its new status
//! and removed from the active collection, so the active view only ever
//! holds untriaged findings. Archived URLs still count as known, so the page
//! is never surfaced again.

use tracing::{debug, info};

use crate::config::StoreLayout;
use crate::core::OpportunityStatus;
use crate::errors::{MentionScoutError, Result};
use crate::store::{url_of_record, Record, TabularStore};

const STATUS_COLUMN: usize = 3;

/// What a status change did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The row was moved to the archive.
    Archived {
        /// URL of the moved row.
        url: String,
    },
    /// Nothing to do.
    Ignored,
}

impl ArchiveOutcome {
    /// Returns true if a row was moved.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived { .. })
    }
}

/// Reacts to an edit of the status cell of active row `row_index`.
///
/// Only a change away from `New` archives. The archive append happens
/// before the delete; if the delete fails the row exists in both
/// collections and the error is returned.
pub async fn on_status_change(
    store: &dyn TabularStore,
    layout: &StoreLayout,
    row_index: usize,
    old_status: &OpportunityStatus,
    new_status: &OpportunityStatus,
) -> Result<ArchiveOutcome> {
    if !old_status.is_new() || new_status.is_new() {
        debug!(row_index, old = %old_status, new = %new_status, "Status change ignored");
        return Ok(ArchiveOutcome::Ignored);
    }

    let rows = store.read_all(&layout.active_collection).await?;
    let row = rows.into_iter().nth(row_index).ok_or_else(|| {
        MentionScoutError::store(format!(
            "row {row_index} not found in '{}'",
            layout.active_collection
        ))
    })?;

    let url = url_of_record(&row).unwrap_or_default().to_string();
    let archived = with_status(row, new_status);

    store.append(&layout.archive_collection, archived).await?;
    store.delete_row(&layout.active_collection, row_index).await?;

    info!(url = %url, status = %new_status, "Archived opportunity");
    Ok(ArchiveOutcome::Archived { url })
}

/// Sets the status of the active row for `url` and archives it.
///
/// The old status is read from the row itself. An unknown URL is ignored.
pub async fn archive_opportunity(
    store: &dyn TabularStore,
    layout: &StoreLayout,
    url: &str,
    new_status: &OpportunityStatus,
) -> Result<ArchiveOutcome> {
    let rows = store.read_all(&layout.active_collection).await?;
    let Some((index, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| url_of_record(row) == Some(url))
    else {
        debug!(url = %url, "No active opportunity to archive");
        return Ok(ArchiveOutcome::Ignored);
    };

    let old_status = status_of(row);
    on_status_change(store, layout, index, &old_status, new_status).await
}

fn status_of(row: &[String]) -> OpportunityStatus {
    match row.get(STATUS_COLUMN).map(|s| s.trim()) {
        None | Some("") => OpportunityStatus::New,
        Some(s) => OpportunityStatus::from(s.to_string()),
    }
}

fn with_status(mut row: Record, status: &OpportunityStatus) -> Record {
    if row.len() <= STATUS_COLUMN {
        row.resize(STATUS_COLUMN + 1, String::new());
    }
    row[STATUS_COLUMN] = status.to_string();
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Opportunity;
    use crate::store::{opportunity_from_record, MemoryStore};
    use crate::testing::{FailingStore, StoreFixture};
    use crate::utils::now_utc;
    use pretty_assertions::assert_eq;

    fn fixture() -> MemoryStore {
        StoreFixture::new()
            .with_active(&Opportunity::new("https://a.com/1", "ctx a", now_utc()))
            .with_active(&Opportunity::new("https://b.com/2", "ctx b", now_utc()))
            .build()
    }

    #[tokio::test]
    async fn test_leaving_new_archives_row() {
        let layout = StoreLayout::default();
        let store = fixture();

        let outcome = on_status_change(
            &store,
            &layout,
            0,
            &OpportunityStatus::New,
            &OpportunityStatus::Contacted,
        )
        .await
        .unwrap();

        assert_eq!(outcome, ArchiveOutcome::Archived { url: "https://a.com/1".into() });
        let active = store.read_all(&layout.active_collection).await.unwrap();
        let archive = store.read_all(&layout.archive_collection).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(url_of_record(&active[0]), Some("https://b.com/2"));

        let moved = opportunity_from_record(&archive[0]).unwrap();
        assert_eq!(moved.url, "https://a.com/1");
        assert_eq!(moved.context_snippet, "ctx a");
        assert_eq!(moved.status, OpportunityStatus::Contacted);
    }

    #[tokio::test]
    async fn test_other_transitions_are_ignored() {
        let layout = StoreLayout::default();
        let store = fixture();

        let cases = [
            (OpportunityStatus::Contacted, OpportunityStatus::Linked),
            (OpportunityStatus::New, OpportunityStatus::New),
            (OpportunityStatus::Rejected, OpportunityStatus::New),
        ];
        for (old, new) in &cases {
            let outcome = on_status_change(&store, &layout, 0, old, new).await.unwrap();
            assert_eq!(outcome, ArchiveOutcome::Ignored);
        }
        assert_eq!(store.row_count(&layout.active_collection), 2);
        assert_eq!(store.row_count(&layout.archive_collection), 0);
    }

    #[tokio::test]
    async fn test_missing_row_is_store_error() {
        let store = fixture();
        let err = on_status_change(
            &store,
            &StoreLayout::default(),
            7,
            &OpportunityStatus::New,
            &OpportunityStatus::Rejected,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MentionScoutError::Store(_)));
    }

    #[tokio::test]
    async fn test_archive_by_url() {
        let layout = StoreLayout::default();
        let store = fixture();

        let outcome = archive_opportunity(
            &store,
            &layout,
            "https://b.com/2",
            &OpportunityStatus::Other("Ignored".into()),
        )
        .await
        .unwrap();
        assert!(outcome.is_archived());

        let archive = store.read_all(&layout.archive_collection).await.unwrap();
        assert_eq!(archive[0][STATUS_COLUMN], "Ignored");

        let again = archive_opportunity(&store, &layout, "https://b.com/2", &OpportunityStatus::Linked)
            .await
            .unwrap();
        assert_eq!(again, ArchiveOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let err = archive_opportunity(
            &FailingStore::new(),
            &StoreLayout::default(),
            "https://a.com/1",
            &OpportunityStatus::Contacted,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MentionScoutError::Store(_)));
    }

    #[test]
    fn test_with_status_pads_short_rows() {
        let row = with_status(vec!["https://a.com".into()], &OpportunityStatus::Linked);
        assert_eq!(row, vec!["https://a.com", "", "", "Linked"]);
    }
}
