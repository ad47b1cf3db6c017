//! Due-date label formatting.
//!
//! Stored due dates are either plain `YYYY-MM-DD` dates or RFC 3339
//! timestamps written by the sync integration. Anything else renders as an
//! empty label.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const LABEL_FORMAT: &str = "%a, %b %-d, %Y";

static DATE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[T ].*)?$").expect("valid date prefix regex")
});

/// Formats a raw due date for display; empty for null, blank or invalid input.
pub fn format_due_date(raw: Option<&str>) -> String {
    raw.and_then(parse_due_date)
        .map(|date| date.format(LABEL_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parses the calendar date of a stored due date.
///
/// RFC 3339 timestamps keep the date in their own offset.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }

    let prefix = DATE_PREFIX_RE.captures(trimmed)?.get(1)?.as_str();
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
