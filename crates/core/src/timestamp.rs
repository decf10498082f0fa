//! Snapshot labels and HTTP dates
//!
//! Every stored snapshot carries its creation instant as a short label
//! (`YYYY-MM-DDTHH:MM:SS.mmmZ`) where the backend keeps message subjects.

use crate::consts::{HTTP_DATE_FORMAT, LABEL_FORMAT, LABEL_PATTERN};
use chrono::{DateTime, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LABEL_REGEX: Regex = Regex::new(LABEL_PATTERN).expect("label pattern is a valid regex");
    static ref WHOLE_LABEL_REGEX: Regex =
        Regex::new(&format!("^{LABEL_PATTERN}$")).expect("label pattern is a valid regex");
}

/// Render an instant as a snapshot label
pub fn format_label(ts: DateTime<Utc>) -> String {
    ts.format(LABEL_FORMAT).to_string()
}

/// Parse a snapshot label, `None` if it is not a valid instant
///
/// The fraction is mandatory and exactly three digits; chrono's `%.3f` alone
/// would also accept a label without it.
pub fn parse_label(label: &str) -> Option<DateTime<Utc>> {
    if !WHOLE_LABEL_REGEX.is_match(label) {
        return None;
    }
    NaiveDateTime::parse_from_str(label, LABEL_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Locate the first label-shaped substring of `text`
///
/// Shape only: `2024-13-45T99:00:00.000Z` is found even though it does not
/// parse.
pub fn find_label(text: &str) -> Option<&str> {
    LABEL_REGEX.find(text).map(|m| m.as_str())
}

/// Render an instant for `Last-Modified`
pub fn http_date(ts: DateTime<Utc>) -> String {
    ts.format(HTTP_DATE_FORMAT).to_string()
}

/// Drop sub-millisecond precision
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
