//! Timestamp and calendar-day helpers.
//!
//! Record stores hold timestamps as text cells, so everything here is about
//! getting a `DateTime<Utc>` or a `NaiveDate` in and out of strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Format used for day keys (`YYYY-MM-DD`).
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur during timestamp parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    /// The timestamp string is empty.
    #[error("Empty timestamp string")]
    EmptyString,

    /// The timestamp value is invalid.
    #[error("Invalid timestamp: {0}")]
    InvalidFormat(String),
}

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// # Examples
///
/// ```
/// use mentionscout::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_iso8601(&Utc::now())
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Returns the current UTC calendar day.
#[must_use]
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Formats a timestamp as ISO 8601 string.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Formats a timestamp for human-facing status text.
#[must_use]
pub fn format_display(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Formats a calendar day as `YYYY-MM-DD`.
#[must_use]
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` day key.
pub fn parse_day(input: &str) -> Result<NaiveDate, TimestampError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::EmptyString);
    }
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .map_err(|_| TimestampError::InvalidFormat(trimmed.to_string()))
}

/// Parses a timestamp cell.
///
/// Accepts RFC 3339 / ISO 8601 (with or without offset), RFC 2822, and bare
/// `YYYY-MM-DD` dates, which are read as midnight UTC.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimestampError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(TimestampError::EmptyString);
    }

    let normalized = trimmed.replace('Z', "+00:00");
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S UTC",
    ];
    for fmt in naive_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(trimmed, DAY_FORMAT) {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(TimestampError::InvalidFormat(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_timestamp("2023-10-05T14:30:00Z").unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.month(), 10);
        assert_eq!(dt.day(), 5);
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn test_parse_roundtrips_own_format() {
        let original = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap();
        let parsed = parse_timestamp(&format_iso8601(&original)).unwrap();
        assert_eq!(parsed, original);

        let parsed = parse_timestamp(&format_display(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(parse_timestamp("   "), Err(TimestampError::EmptyString));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_timestamp("last tuesday"),
            Err(TimestampError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_day_roundtrip() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(format_day(day), "2025-12-31");
        assert_eq!(parse_day("2025-12-31").unwrap(), day);
        assert!(parse_day("31/12/2025").is_err());
        assert_eq!(parse_day(""), Err(TimestampError::EmptyString));
    }

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }
}
