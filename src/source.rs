//! Where raw post units come from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::extract::RawUnit;
use crate::post::RawPost;

/// A collector of raw post units for a set of search terms.
#[async_trait]
pub trait PostSource: Send {
    /// Collect raw units for `keywords` and `hashtags`.
    ///
    /// Implementations degrade to fewer (or zero) units on partial failure and
    /// only return an error when nothing could be attempted at all.
    async fn collect(&mut self, keywords: &[String], hashtags: &[String]) -> Result<Vec<RawUnit>>;

    /// Release any resources held between runs.
    async fn close(&mut self) {}
}

/// Replays raw post mappings saved as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PostSource for JsonFileSource {
    async fn collect(&mut self, _keywords: &[String], _hashtags: &[String]) -> Result<Vec<RawUnit>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read raw posts from {}", self.path.display()))?;
        let entries: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse raw posts in {}", self.path.display()))?;
        let total = entries.len();
        let units: Vec<RawUnit> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| parse_entry(index, entry))
            .collect();
        info!(
            count = units.len(),
            skipped = total - units.len(),
            path = %self.path.display(),
            "Loaded raw posts"
        );
        Ok(units)
    }
}

/// One array element as a raw unit; malformed elements are dropped.
fn parse_entry(index: usize, entry: Value) -> Option<RawUnit> {
    match serde_json::from_value::<RawPost>(entry) {
        Ok(post) => Some(RawUnit::from(post)),
        Err(e) => {
            debug!(index, "Skipping malformed raw post: {e}");
            None
        }
    }
}
