use chrono::{DateTime, Utc};

use super::Extract;
use crate::constants::UNKNOWN_AUTHOR;
use crate::post::{PostRecord, RawPost};
use crate::text::{normalize, snippet};
use crate::urls::canonicalize;

impl Extract for RawPost {
    fn extract(&self, _now: DateTime<Utc>) -> Option<PostRecord> {
        let post_url = self.post_url.as_deref().map(canonicalize).unwrap_or_default();
        let text = self.text.as_deref().map(normalize).unwrap_or_default();

        if post_url.is_empty() && text.is_empty() {
            return None;
        }

        let author_name = self
            .author_name
            .as_deref()
            .map(normalize)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Some(PostRecord {
            post_url,
            author_url: self.author_url.as_deref().map(canonicalize).unwrap_or_default(),
            author_name,
            text_snippet: snippet(&text),
            text,
            date_posted: self.date_posted.clone(),
            likes: self.likes.unwrap_or(0),
            comments: self.comments.unwrap_or(0),
            score: None,
        })
    }
}
