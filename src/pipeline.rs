//! Ranking pipeline: adapt → date filter → dedupe → score → sort → clean.
//!
//! Every stage is a pure function over an in-memory list. Per-record problems
//! drop the record or fall back to a default; nothing here fails the batch.

use std::cmp::Reverse;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clean::clean_at;
use crate::date_filter::filter_recent_at;
use crate::dedup::{dedupe, KeyField};
use crate::extract::{adapt_all, RawUnit};
use crate::post::PostRecord;
use crate::scoring::KeywordScorer;

/// A point in the pipeline where the record set can run dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collection,
    Adaptation,
    DateFilter,
    Dedup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collection => "collection",
            Self::Adaptation => "adaptation",
            Self::DateFilter => "date filter",
            Self::Dedup => "deduplication",
        };
        f.write_str(name)
    }
}

/// Record counts after each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub raw: usize,
    pub adapted: usize,
    pub recent: usize,
    pub unique: usize,
    /// Posts with a score above zero.
    pub matching: usize,
}

impl PipelineStats {
    /// The first stage that left no records, if any did.
    #[must_use]
    pub fn emptied_at(&self) -> Option<Stage> {
        [
            (Stage::Collection, self.raw),
            (Stage::Adaptation, self.adapted),
            (Stage::DateFilter, self.recent),
            (Stage::Dedup, self.unique),
        ]
        .into_iter()
        .find(|&(_, count)| count == 0)
        .map(|(stage, _)| stage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Cleaned posts, highest score first.
    pub posts: Vec<PostRecord>,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    #[must_use]
    pub fn top_score(&self) -> u32 {
        self.posts.first().map_or(0, PostRecord::score_or_zero)
    }
}

/// Run the pipeline against the current time.
#[must_use]
pub fn run_pipeline<S: AsRef<str>>(
    raw: &[RawUnit],
    keywords: &[S],
    days_limit: Option<i64>,
) -> PipelineOutput {
    run_pipeline_at(raw, keywords, days_limit, Utc::now())
}

/// Run the pipeline with an explicit clock.
#[must_use]
pub fn run_pipeline_at<S: AsRef<str>>(
    raw: &[RawUnit],
    keywords: &[S],
    days_limit: Option<i64>,
    now: DateTime<Utc>,
) -> PipelineOutput {
    let mut stats = PipelineStats {
        raw: raw.len(),
        ..PipelineStats::default()
    };

    let records = adapt_all(raw, now);
    stats.adapted = records.len();

    let records = filter_recent_at(records, days_limit, now);
    stats.recent = records.len();
    debug!(days_limit = ?days_limit, before = stats.adapted, after = stats.recent, "Applied date filter");

    let mut records = dedupe(records, KeyField::PostUrl);
    stats.unique = records.len();

    let scorer = KeywordScorer::new(keywords);
    for record in &mut records {
        record.score = Some(scorer.score(&record.text));
    }
    // stable: equal scores keep their relative order
    records.sort_by_key(|record| Reverse(record.score_or_zero()));

    let posts: Vec<PostRecord> = records
        .into_iter()
        .map(|record| clean_at(record, now))
        .collect();
    stats.matching = posts.iter().filter(|p| p.score_or_zero() > 0).count();

    info!(
        raw = stats.raw,
        adapted = stats.adapted,
        recent = stats.recent,
        unique = stats.unique,
        matching = stats.matching,
        "Pipeline finished"
    );

    PipelineOutput { posts, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::RawPost;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn unit(url: &str, text: &str) -> RawUnit {
        RawUnit::from(RawPost {
            post_url: Some(url.to_string()),
            text: Some(text.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_emptied_at() {
        let stats = PipelineStats {
            raw: 3,
            adapted: 2,
            recent: 0,
            unique: 0,
            matching: 0,
        };
        assert_eq!(stats.emptied_at(), Some(Stage::DateFilter));
        assert_eq!(PipelineStats::default().emptied_at(), Some(Stage::Collection));

        let full = PipelineStats {
            raw: 1,
            adapted: 1,
            recent: 1,
            unique: 1,
            matching: 0,
        };
        assert_eq!(full.emptied_at(), None);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let output = run_pipeline_at(&[], &["hiring"], Some(7), now());
        assert!(output.posts.is_empty());
        assert_eq!(output.top_score(), 0);
        assert_eq!(output.stats.emptied_at(), Some(Stage::Collection));
    }

    #[test]
    fn test_scores_set_and_sorted() {
        let raw = vec![
            unit("/posts/a", "nothing relevant"),
            unit("/posts/b", "hiring hiring"),
            unit("/posts/c", "hiring"),
        ];
        let output = run_pipeline_at(&raw, &["hiring"], None, now());
        let urls: Vec<&str> = output.posts.iter().map(|p| p.post_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.linkedin.com/posts/b",
                "https://www.linkedin.com/posts/c",
                "https://www.linkedin.com/posts/a",
            ]
        );
        assert!(output.posts.iter().all(|p| p.score.is_some()));
        assert_eq!(output.top_score(), 2);
        assert_eq!(output.stats.matching, 2);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Dedup.to_string(), "deduplication");
        assert_eq!(Stage::DateFilter.to_string(), "date filter");
    }
}
