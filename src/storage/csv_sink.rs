//! Flat CSV export of ranked posts.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::post::PostRecord;

/// Column order of the export.
pub const CSV_COLUMNS: [&str; 8] = [
    "date",
    "author",
    "author_url",
    "post_url",
    "text_snippet",
    "score",
    "likes",
    "comments",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    author: &'a str,
    author_url: &'a str,
    post_url: &'a str,
    text_snippet: &'a str,
    score: u32,
    likes: u64,
    comments: u64,
}

impl<'a> CsvRow<'a> {
    fn new(record: &'a PostRecord, now: DateTime<Utc>) -> Self {
        Self {
            date: record.date_or(now).format("%Y-%m-%d").to_string(),
            author: &record.author_name,
            author_url: &record.author_url,
            post_url: &record.post_url,
            text_snippet: &record.text_snippet,
            score: record.score_or_zero(),
            likes: record.likes,
            comments: record.comments,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `posts` in order, returning the number of rows written.
    ///
    /// When appending to a non-empty file the header row is not repeated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn write(&self, posts: &[PostRecord], append: bool, now: DateTime<Utc>) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let has_content = std::fs::metadata(&self.path).is_ok_and(|m| m.len() > 0);
        let (file, write_header) = if append {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path);
            (file, !has_content)
        } else {
            (File::create(&self.path), true)
        };
        let file = file.with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for record in posts {
            writer
                .serialize(CsvRow::new(record, now))
                .context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV file")?;

        Ok(posts.len())
    }
}
