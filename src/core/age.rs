//! Human-readable "last updated" labels.

use chrono::{DateTime, NaiveDateTime, Utc};

const UNKNOWN: &str = "Unknown";

/// SQL datetime layouts accepted in addition to RFC 3339, all read as UTC.
const SQL_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Buckets the time between `timestamp` and `now` into "Just now", minutes, hours
/// or days. Timestamps in the future read as "Just now".
#[must_use]
pub fn format_relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else {
        plural(elapsed.num_days(), "day")
    }
}

/// Parses an RFC 3339 or SQL datetime string, treating zone-less values as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    SQL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Like [`format_relative_age`] for a timestamp that still needs parsing.
/// Unparsable input yields `"Unknown"`.
#[must_use]
pub fn format_relative_age_str(raw: &str, now: DateTime<Utc>) -> String {
    parse_timestamp(raw).map_or_else(|| UNKNOWN.to_string(), |ts| format_relative_age(ts, now))
}
