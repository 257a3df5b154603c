//! Recency cutoff.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::post::{DatePosted, PostRecord};

/// Keep posts from the last `days_limit` days, measured from now.
#[must_use]
pub fn filter_recent(records: Vec<PostRecord>, days_limit: Option<i64>) -> Vec<PostRecord> {
    filter_recent_at(records, days_limit, Utc::now())
}

/// Keep posts published at or after `now - days_limit`.
///
/// A missing or non-positive limit disables filtering. Dates that are missing
/// or cannot be parsed keep the post; only a parsed date strictly before the
/// cutoff excludes it.
#[must_use]
pub fn filter_recent_at(
    records: Vec<PostRecord>,
    days_limit: Option<i64>,
    now: DateTime<Utc>,
) -> Vec<PostRecord> {
    let Some(days) = days_limit.filter(|d| *d > 0) else {
        return records;
    };
    let Some(cutoff) = Duration::try_days(days).and_then(|d| now.checked_sub_signed(d)) else {
        return records;
    };

    records
        .into_iter()
        .filter(|record| is_recent(record, cutoff))
        .collect()
}

fn is_recent(record: &PostRecord, cutoff: DateTime<Utc>) -> bool {
    let Some(date) = &record.date_posted else {
        return true;
    };
    match date.resolve() {
        Some(ts) if ts < cutoff => {
            debug!(post_url = %record.post_url, date = %ts, "Dropping post older than cutoff");
            false
        }
        Some(_) => true,
        None => {
            if let DatePosted::Text(raw) = date {
                debug!(post_url = %record.post_url, date = %raw, "Keeping post with unparseable date");
            }
            true
        }
    }
}
