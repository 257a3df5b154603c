//! Persistence of ranked posts: CSV export, SQLite upsert, and the run log.

mod csv_sink;
mod run_log;

pub use csv_sink::{CsvSink, CSV_COLUMNS};
pub use run_log::append_run_log;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::db::{upsert_post, Database, NewPost, UpsertOutcome};
use crate::post::PostRecord;

/// What a save did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub csv_rows: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records without a permalink, or whose database write failed.
    pub skipped: usize,
}

pub struct StorageManager {
    csv: CsvSink,
    db: Database,
    db_path: PathBuf,
}

impl StorageManager {
    /// Open the CSV sink and the database named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let db = Database::new(&config.db_file).await?;

        Ok(Self {
            csv: CsvSink::new(&config.csv_file),
            db,
            db_path: config.db_file.clone(),
        })
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Write `posts` to the CSV, then upsert them into the database.
    ///
    /// Individual database failures are logged and counted as skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV cannot be written.
    pub async fn save_posts(&self, posts: &[PostRecord], append: bool) -> Result<SaveReport> {
        self.save_posts_at(posts, append, Utc::now()).await
    }

    /// [`Self::save_posts`] with an explicit clock for missing dates.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV cannot be written.
    pub async fn save_posts_at(
        &self,
        posts: &[PostRecord],
        append: bool,
        now: DateTime<Utc>,
    ) -> Result<SaveReport> {
        if posts.is_empty() {
            info!("No posts to save");
            return Ok(SaveReport::default());
        }

        let sink = self.csv.clone();
        let rows = posts.to_vec();
        let csv_rows = tokio::task::spawn_blocking(move || sink.write(&rows, append, now))
            .await
            .context("CSV writer task panicked")??;
        info!(rows = csv_rows, path = %self.csv.path().display(), append, "Wrote CSV");

        let mut report = SaveReport {
            csv_rows,
            ..SaveReport::default()
        };
        for record in posts {
            if record.post_url.is_empty() {
                debug!(author = %record.author_name, "Skipping database write for post without permalink");
                report.skipped += 1;
                continue;
            }
            match upsert_post(self.db.pool(), &NewPost::from_record(record, now)).await {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(post_url = %record.post_url, "Failed to store post: {e:#}");
                    report.skipped += 1;
                }
            }
        }
        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            path = %self.db_path.display(),
            "Saved posts to database"
        );

        Ok(report)
    }
}
