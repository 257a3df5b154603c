use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post::PostRecord;

/// A post row as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredPost {
    pub id: i64,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub post_url: String,
    pub text_snippet: Option<String>,
    pub full_text: Option<String>,
    pub score: i64,
    pub likes: i64,
    pub comments: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Data for inserting or refreshing a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub date: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub post_url: String,
    pub text_snippet: Option<String>,
    pub full_text: Option<String>,
    pub score: i64,
    pub likes: i64,
    pub comments: i64,
}

impl NewPost {
    /// Flatten a ranked record into a row; a missing date is stored as `now`.
    #[must_use]
    pub fn from_record(record: &PostRecord, now: DateTime<Utc>) -> Self {
        Self {
            date: record.date_or(now).format("%Y-%m-%d").to_string(),
            author: non_empty(&record.author_name),
            author_url: non_empty(&record.author_url),
            post_url: record.post_url.clone(),
            text_snippet: non_empty(&record.text_snippet),
            full_text: non_empty(&record.text),
            score: i64::from(record.score_or_zero()),
            likes: i64::try_from(record.likes).unwrap_or(i64::MAX),
            comments: i64::try_from(record.comments).unwrap_or(i64::MAX),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Whether an upsert created a row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
