//! Utility functions for run identifiers and timestamp handling.

pub mod timestamps;

use uuid::Uuid;

pub use timestamps::{
    format_day, format_display, format_iso8601, iso_timestamp, now_utc, parse_day,
    parse_timestamp, today_utc, Timestamp, TimestampError,
};

/// Generates a time-ordered identifier for a discovery run.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::now_v7()
}
