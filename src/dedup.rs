//! Duplicate elimination with a fallback identity chain.
//!
//! Each record resolves to a key by trying, in order: the configured key field,
//! a content hash of the full text, and a content hash of the first 50
//! characters of the text. Records that resolve to no key are always kept.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::post::PostRecord;

/// Number of leading characters hashed by the last resolver in the chain.
const PREFIX_CHARS: usize = 50;

/// Digest length, in bytes, of the content hash used as a fallback key.
const CONTENT_HASH_BYTES: usize = 16;

/// The record field used as primary dedup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyField {
    #[default]
    PostUrl,
    AuthorUrl,
}

impl KeyField {
    fn value(self, record: &PostRecord) -> &str {
        match self {
            Self::PostUrl => &record.post_url,
            Self::AuthorUrl => &record.author_url,
        }
    }
}

type KeyResolver = fn(&PostRecord, KeyField) -> Option<String>;

/// Resolvers tried in order; the first non-empty key wins.
const KEY_RESOLVERS: &[KeyResolver] = &[by_field, by_text_hash, by_text_prefix_hash];

fn by_field(record: &PostRecord, field: KeyField) -> Option<String> {
    let value = field.value(record);
    (!value.is_empty()).then(|| value.to_string())
}

fn by_text_hash(record: &PostRecord, _field: KeyField) -> Option<String> {
    (!record.text.is_empty()).then(|| content_hash(&record.text))
}

fn by_text_prefix_hash(record: &PostRecord, _field: KeyField) -> Option<String> {
    let prefix: String = record.text.chars().take(PREFIX_CHARS).collect();
    (!prefix.is_empty()).then(|| content_hash(&prefix))
}

/// Hex-encoded 16-byte content fingerprint of `text`.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..CONTENT_HASH_BYTES])
}

/// Resolve the identity key for a record, or `None` if it has none.
#[must_use]
pub fn resolve_key(record: &PostRecord, field: KeyField) -> Option<String> {
    KEY_RESOLVERS
        .iter()
        .find_map(|resolver| resolver(record, field))
}

/// Remove duplicates, keeping the first occurrence of each key in input order.
#[must_use]
pub fn dedupe(records: Vec<PostRecord>, field: KeyField) -> Vec<PostRecord> {
    let mut seen = HashSet::new();
    let before = records.len();

    let unique: Vec<PostRecord> = records
        .into_iter()
        .filter(|record| match resolve_key(record, field) {
            Some(key) => {
                let first = seen.insert(key);
                if !first {
                    debug!(post_url = %record.post_url, "Dropping duplicate post");
                }
                first
            }
            None => true,
        })
        .collect();

    debug!(before, after = unique.len(), "Deduplicated posts");
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn post(url: &str, text: &str) -> PostRecord {
        PostRecord {
            post_url: url.to_string(),
            author_url: String::new(),
            author_name: "Unknown".to_string(),
            text: text.to_string(),
            text_snippet: String::new(),
            date_posted: None,
            likes: 0,
            comments: 0,
            score: None,
        }
    }

    fn keys(records: &[PostRecord]) -> Vec<&str> {
        records.iter().map(|r| r.post_url.as_str()).collect()
    }

    #[test]
    fn test_content_hash_is_16_bytes_hex() {
        let hash = content_hash("Hiring now");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash("Hiring now"));
        assert_ne!(hash, content_hash("Hiring later"));
    }

    #[test]
    fn test_first_seen_order_preserved() {
        let records = vec![post("a", "1"), post("b", "2"), post("a", "3"), post("c", "4")];
        let unique = dedupe(records, KeyField::PostUrl);
        assert_eq!(keys(&unique), vec!["a", "b", "c"]);
        assert_eq!(unique[0].text, "1");
    }

    #[test]
    fn test_missing_url_falls_back_to_text_hash() {
        let records = vec![post("", "Hiring now"), post("", "Hiring now"), post("", "Other")];
        let unique = dedupe(records, KeyField::PostUrl);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[1].text, "Other");
    }

    #[test]
    fn test_keyless_records_always_kept() {
        let records = vec![post("", ""), post("", ""), post("a", "x")];
        assert_eq!(dedupe(records, KeyField::PostUrl).len(), 3);
    }

    #[test]
    fn test_resolve_key_chain() {
        assert_eq!(resolve_key(&post("u", "t"), KeyField::PostUrl).as_deref(), Some("u"));
        assert_eq!(
            resolve_key(&post("", "t"), KeyField::PostUrl),
            Some(content_hash("t"))
        );
        assert_eq!(resolve_key(&post("", ""), KeyField::PostUrl), None);
    }

    #[test]
    fn test_author_url_key_field() {
        let mut first = post("a", "x");
        first.author_url = "https://www.linkedin.com/in/jane".to_string();
        let mut second = post("b", "y");
        second.author_url = "https://www.linkedin.com/in/jane".to_string();
        let unique = dedupe(vec![first, second], KeyField::AuthorUrl);
        assert_eq!(keys(&unique), vec!["a"]);
    }

    proptest! {
        #[test]
        fn prop_dedupe_idempotent(
            pairs in proptest::collection::vec(("[ab]?", "[xy]{0,2}"), 0..12)
        ) {
            let records: Vec<PostRecord> = pairs.iter().map(|(u, t)| post(u, t)).collect();
            let once = dedupe(records, KeyField::PostUrl);
            prop_assert_eq!(dedupe(once.clone(), KeyField::PostUrl), once);
        }
    }
}
