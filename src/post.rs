//! The canonical post record and the flattened raw mapping handed over by the driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_timestamp;

/// When a post was published.
///
/// Mappings from the driver may carry a date as free text that has not been
/// parsed yet; the cleaner turns those into timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatePosted {
    At(DateTime<Utc>),
    Text(String),
}

impl DatePosted {
    /// The timestamp, parsing textual values on the fly. `None` if unparseable.
    #[must_use]
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(ts) => Some(*ts),
            Self::Text(raw) => parse_timestamp(raw),
        }
    }
}

impl From<DateTime<Utc>> for DatePosted {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::At(ts)
    }
}

/// A scraped post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Permalink; identity of the post. Empty only for mapping input without one.
    pub post_url: String,
    pub author_url: String,
    pub author_name: String,
    pub text: String,
    /// Derived from `text`, see [`crate::text::snippet`].
    pub text_snippet: String,
    pub date_posted: Option<DatePosted>,
    pub likes: u64,
    pub comments: u64,
    /// Keyword relevance; `None` until the scoring stage.
    pub score: Option<u32>,
}

impl PostRecord {
    #[must_use]
    pub fn score_or_zero(&self) -> u32 {
        self.score.unwrap_or(0)
    }

    /// Publication date for display and storage; falls back to `now` when
    /// missing or unparseable.
    #[must_use]
    pub fn date_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.date_posted
            .as_ref()
            .and_then(DatePosted::resolve)
            .unwrap_or(now)
    }
}

/// A pre-flattened post as produced by the driver's in-page extraction.
///
/// Every field is optional; the adapter fills defaults and rejects units with
/// neither a permalink nor text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPost {
    pub post_url: Option<String>,
    pub author_url: Option<String>,
    pub author_name: Option<String>,
    pub text: Option<String>,
    pub date_posted: Option<DatePosted>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
}
