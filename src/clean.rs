//! Final per-record normalization before persistence.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dates::parse_timestamp;
use crate::post::{DatePosted, PostRecord};
use crate::text::{normalize, snippet};
use crate::urls::absolutize;

/// Clean a record using the current time for unparseable dates.
#[must_use]
pub fn clean(record: PostRecord) -> PostRecord {
    clean_at(record, Utc::now())
}

/// Clean a record.
///
/// - `text` is normalized and `text_snippet` recomputed from it.
/// - Relative `post_url`/`author_url` values get the platform base URL.
/// - A textual `date_posted` is parsed, or replaced by `now` if it cannot be.
///
/// Applying this twice gives the same record as applying it once.
#[must_use]
pub fn clean_at(mut record: PostRecord, now: DateTime<Utc>) -> PostRecord {
    record.text = normalize(&record.text);
    record.text_snippet = snippet(&record.text);

    record.post_url = absolutize(&record.post_url);
    record.author_url = absolutize(&record.author_url);

    if let Some(DatePosted::Text(raw)) = &record.date_posted {
        let parsed = parse_timestamp(raw).unwrap_or_else(|| {
            debug!(date = %raw, post_url = %record.post_url, "Unparseable date, using current time");
            now
        });
        record.date_posted = Some(DatePosted::At(parsed));
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn record() -> PostRecord {
        PostRecord {
            post_url: "/posts/1".to_string(),
            author_url: "/in/jane".to_string(),
            author_name: "Jane".to_string(),
            text: "  We are\n hiring  ".to_string(),
            text_snippet: "stale".to_string(),
            date_posted: Some(DatePosted::Text("2024-02-01T09:00:00Z".to_string())),
            likes: 4,
            comments: 2,
            score: Some(1),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_clean_normalizes_everything() {
        let cleaned = clean_at(record(), now());
        assert_eq!(cleaned.text, "We are hiring");
        assert_eq!(cleaned.text_snippet, "We are hiring");
        assert_eq!(cleaned.post_url, "https://www.linkedin.com/posts/1");
        assert_eq!(cleaned.author_url, "https://www.linkedin.com/in/jane");
        assert_eq!(
            cleaned.date_posted,
            Some(DatePosted::At(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()))
        );
        assert_eq!(cleaned.author_name, "Jane");
        assert_eq!(cleaned.likes, 4);
        assert_eq!(cleaned.comments, 2);
        assert_eq!(cleaned.score, Some(1));
    }

    #[test]
    fn test_clean_unparseable_date_uses_now() {
        let mut raw = record();
        raw.date_posted = Some(DatePosted::Text("last Tuesday".to_string()));
        assert_eq!(clean_at(raw, now()).date_posted, Some(DatePosted::At(now())));
    }

    #[test]
    fn test_clean_leaves_missing_date_and_empty_urls() {
        let mut raw = record();
        raw.date_posted = None;
        raw.author_url = String::new();
        let cleaned = clean_at(raw, now());
        assert_eq!(cleaned.date_posted, None);
        assert_eq!(cleaned.author_url, "");
    }

    #[test]
    fn test_clean_idempotent() {
        let once = clean_at(record(), now());
        let twice = clean_at(once.clone(), now());
        assert_eq!(once, twice);
    }

    proptest! {
        #[test]
        fn prop_clean_idempotent(
            text in "\\PC{0,300}",
            url in "(/posts/[a-z0-9]{1,8})?",
            date in "(2024-0[1-9]-1[0-9]|[a-z ]{0,10})",
        ) {
            let raw = PostRecord {
                post_url: url,
                author_url: String::new(),
                author_name: "Unknown".to_string(),
                text,
                text_snippet: String::new(),
                date_posted: Some(DatePosted::Text(date)),
                likes: 0,
                comments: 0,
                score: None,
            };
            let once = clean_at(raw, now());
            prop_assert_eq!(clean_at(once.clone(), now()), once);
        }
    }
}
