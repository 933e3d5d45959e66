//! Calendar-date helpers shared by scheduling and reducer code.
//!
//! # Responsibility
//! - Parse user/persisted date strings into `NaiveDate`.
//! - Produce canonical `YYYY-MM-DD` strings and short display labels.
//! - Shift dates by whole-day offsets.
//!
//! # Invariants
//! - No helper in this module panics on malformed input.
//! - Invalid input degrades to `None` (or an empty display string).

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

const CANONICAL_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%b %-d";
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a date string into a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DDTHH:MM[:SS]`;
/// time-bearing inputs keep only their calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, CANONICAL_FORMAT) {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|timestamp| timestamp.date())
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn to_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// Normalizes a date string to `YYYY-MM-DD`, or `None` when it does not parse.
pub fn canonicalize(value: &str) -> Option<String> {
    parse_date(value).map(to_canonical)
}

/// Shifts a date by `days`, returning `None` on calendar overflow.
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let offset = Duration::try_days(days)?;
    date.checked_add_signed(offset)
}

/// Shifts a date string by `days` and returns the canonical result.
///
/// Returns `None` when `date` does not parse or the result overflows.
pub fn add_offset(date: &str, days: i64) -> Option<String> {
    parse_date(date)
        .and_then(|parsed| shift_days(parsed, days))
        .map(to_canonical)
}

/// Short month/day label, e.g. `Apr 30`. Empty for invalid input.
pub fn format_display(date: &str) -> String {
    parse_date(date)
        .map(|parsed| parsed.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}
