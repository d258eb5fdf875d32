//! Row layouts for queries and opportunities.
//!
//! Opportunity rows are `[url, context, date_found, status]`; query rows are
//! `[text, last_checked]`. Both are read leniently because operators edit
//! them by hand.

use super::Record;
use crate::core::{Opportunity, OpportunityStatus, Query};
use crate::errors::{MentionScoutError, Result};
use crate::utils::{format_iso8601, parse_timestamp};

/// Encodes an opportunity as a row.
#[must_use]
pub fn opportunity_to_record(opportunity: &Opportunity) -> Record {
    vec![
        opportunity.url.clone(),
        opportunity.context_snippet.clone(),
        format_iso8601(&opportunity.discovered_at),
        opportunity.status.to_string(),
    ]
}

/// Decodes an opportunity row.
///
/// A blank status reads as `New`.
pub fn opportunity_from_record(record: &[String]) -> Result<Opportunity> {
    let url = url_of_record(record)
        .ok_or_else(|| MentionScoutError::parse("opportunity row has no URL"))?;
    let cell = |i: usize| record.get(i).map_or("", String::as_str);

    let discovered_at = parse_timestamp(cell(2))
        .map_err(|e| MentionScoutError::parse(format!("opportunity row for {url}: {e}")))?;
    let status = if cell(3).trim().is_empty() {
        OpportunityStatus::New
    } else {
        OpportunityStatus::from(cell(3).to_string())
    };

    Ok(Opportunity::new(url, cell(1), discovered_at).with_status(status))
}

/// Encodes a query as a row.
#[must_use]
pub fn query_to_record(query: &Query) -> Record {
    vec![
        query.text.clone(),
        query
            .last_checked_at
            .as_ref()
            .map(format_iso8601)
            .unwrap_or_default(),
    ]
}

/// Decodes a query row. An unreadable timestamp is treated as never checked.
#[must_use]
pub fn query_from_record(record: &[String]) -> Query {
    let text = record.first().map(|s| s.trim().to_string()).unwrap_or_default();
    let last_checked_at = record.get(1).and_then(|s| parse_timestamp(s).ok());
    Query {
        text,
        last_checked_at,
    }
}

/// The raw URL cell of an opportunity row, if present and non-blank.
///
/// The cell is returned untrimmed: duplicate detection compares exact strings.
#[must_use]
pub fn url_of_record(record: &[String]) -> Option<&str> {
    record
        .first()
        .map(String::as_str)
        .filter(|url| !url.trim().is_empty())
}
