//! Console summary of a run.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::StorageConfig;
use crate::pipeline::{PipelineOutput, PipelineStats};
use crate::post::PostRecord;
use crate::storage::SaveReport;

/// Rows shown in the top-posts table.
pub const TOP_POSTS_LIMIT: usize = 5;

const RULE_WIDTH: usize = 100;
const AUTHOR_WIDTH: usize = 24;
const SNIPPET_WIDTH: usize = 48;
const URL_WIDTH: usize = 80;

/// Absolute paths of the run's outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocations {
    pub csv: PathBuf,
    pub db: PathBuf,
    pub log: PathBuf,
}

impl OutputLocations {
    #[must_use]
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self {
            csv: absolute(&storage.csv_file),
            db: absolute(&storage.db_file),
            log: absolute(&storage.log_file),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Everything a finished run reports.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Ranked posts, highest score first.
    pub posts: Vec<PostRecord>,
    pub stats: PipelineStats,
    /// `None` when there was nothing to save.
    pub saved: Option<SaveReport>,
    pub locations: OutputLocations,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    #[must_use]
    pub fn new(
        output: PipelineOutput,
        saved: Option<SaveReport>,
        locations: OutputLocations,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            posts: output.posts,
            stats: output.stats,
            saved,
            locations,
            finished_at,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn top_score(&self) -> u32 {
        self.posts.first().map_or(0, PostRecord::score_or_zero)
    }

    /// Posts with at least one keyword hit.
    #[must_use]
    pub fn matching(&self) -> usize {
        self.posts.iter().filter(|p| p.score_or_zero() > 0).count()
    }

    /// The line appended to the run log.
    #[must_use]
    pub fn log_line(&self) -> String {
        format!("Scraped {} posts. Top score: {}", self.total(), self.top_score())
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(idx, _)| &text[..idx])
}

/// The top `limit` posts as a fixed-width table.
#[must_use]
pub fn render_top_posts(posts: &[PostRecord], limit: usize, now: DateTime<Utc>) -> String {
    if posts.is_empty() {
        return "No posts to display.\n".to_string();
    }

    let top = &posts[..posts.len().min(limit)];
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);

    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "TOP {} HIRING POSTS (by relevance score)", top.len());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{:<12} {:<25} {:<6} {:<50}", "Date", "Author", "Score", "Text Snippet");
    let _ = writeln!(out, "{thin}");
    for post in top {
        let date = post.date_or(now).format("%Y-%m-%d").to_string();
        let _ = writeln!(
            out,
            "{:<12} {:<25} {:<6} {:<50}",
            date,
            truncate_chars(&post.author_name, AUTHOR_WIDTH),
            post.score_or_zero(),
            truncate_chars(&post.text_snippet, SNIPPET_WIDTH),
        );
        let _ = writeln!(out, "{:12} URL: {}", "", truncate_chars(&post.post_url, URL_WIDTH));
        let _ = writeln!(out, "{thin}");
    }
    out
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        let csv = self.locations.csv.display();
        let db = self.locations.db.display();
        let log = self.locations.log.display();

        if self.posts.is_empty() {
            writeln!(f, "No posts to save.")?;
            if let Some(stage) = self.stats.emptied_at() {
                writeln!(f, "   No posts left after {stage}.")?;
            }
            writeln!(f, "   Data would be saved to:")?;
            writeln!(f, "   CSV File: {csv}")?;
            writeln!(f, "   SQLite Database: {db}")?;
            writeln!(f, "   Log File: {log}")?;
            return Ok(());
        }

        f.write_str(&render_top_posts(&self.posts, TOP_POSTS_LIMIT, self.finished_at))?;
        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "SCRAPING COMPLETE")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Data saved to:")?;
        writeln!(f, "   CSV File: {csv}")?;
        writeln!(f, "   SQLite Database: {db}")?;
        writeln!(f, "   Log File: {log}")?;
        if let Some(saved) = &self.saved {
            writeln!(
                f,
                "   ({} new, {} updated, {} not stored in the database)",
                saved.inserted, saved.updated, saved.skipped
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "   - Total posts scraped: {}", self.total())?;
        writeln!(f, "   - Top relevance score: {}", self.top_score())?;
        writeln!(f, "   - Posts with hiring keywords: {}", self.matching())?;
        write!(f, "{rule}")
    }
}
