//! Timestamp extraction from upstream listings.
//!
//! Each sensor variant encodes acquisition time in its file names differently
//! (see [`TIMESTAMP_FORMATS`]). Extraction finds every match in a listing,
//! parses it, and reports how old the newest one is.
//!
//! When nothing in the listing matches, the newest timestamp is taken to be
//! [`sentinel`] (noon, 1 January 2000). The resulting age is huge, which is
//! what we want: an empty or unrecognisable listing must trip the threshold
//! instead of passing for healthy.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::debug;

use productwatch_types::{SensorVariant, TIMESTAMP_FORMATS};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Compiled patterns, keyed by the variant of their table row.
fn patterns() -> &'static BTreeMap<SensorVariant, Regex> {
    static PATTERNS: OnceLock<BTreeMap<SensorVariant, Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TIMESTAMP_FORMATS
            .iter()
            .map(|row| {
                let regex = Regex::new(row.pattern).expect("timestamp patterns are valid");
                (row.variant, regex)
            })
            .collect()
    })
}

/// The floor used when a listing holds no recognisable timestamp.
pub fn sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// All timestamps found in `text` for the given variant, in listing order.
///
/// Text that matches the pattern but is not a valid date (day-of-year 400,
/// hour 25) is skipped.
pub fn extract_timestamps(variant: SensorVariant, text: &str) -> Vec<NaiveDateTime> {
    let format = variant.timestamp_format();
    let Some(pattern) = patterns().get(&variant) else {
        debug!("No timestamp pattern for {}", variant);
        return Vec::new();
    };

    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| match NaiveDateTime::parse_from_str(m.as_str(), format.format) {
            Ok(timestamp) => Some(timestamp),
            Err(e) => {
                debug!("Ignoring {} timestamp '{}': {}", variant, m.as_str(), e);
                None
            }
        })
        .collect()
}

/// Newest timestamp in `text`, or [`sentinel`] if there is none.
pub fn most_recent(variant: SensorVariant, text: &str) -> NaiveDateTime {
    extract_timestamps(variant, text)
        .into_iter()
        .fold(sentinel(), NaiveDateTime::max)
}

/// Hours elapsed between `timestamp` and `now`, never negative.
pub fn age_hours(now: DateTime<Utc>, timestamp: NaiveDateTime) -> f64 {
    let elapsed = now.naive_utc() - timestamp;
    (elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR).max(0.0)
}

/// Age in hours of the newest image named in an upstream listing.
pub fn extract_most_recent_age(variant: SensorVariant, text: &str, now: DateTime<Utc>) -> f64 {
    let newest = most_recent(variant, text);
    let age = age_hours(now, newest);
    debug!("Most recent {} image upstream: {} ({:.2} hours old)", variant, newest, age);
    age
}
