mod migrations;
mod models;
mod queries;

pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::debug;

/// The SQLite store of ranked posts, keyed by permalink.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        // A scheduled run can overlap a manual one against the same file.
        .busy_timeout(Duration::from_secs(10))
}

impl Database {
    /// Open (creating if missing) the post database and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, migrated, or written.
    pub async fn new(path: &Path) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(connect_options(path))
            .await
            .with_context(|| format!("Failed to open post database at {}", path.display()))?;

        migrations::run(&pool)
            .await
            .with_context(|| format!("Failed to migrate post database at {}", path.display()))?;
        ensure_writable(&pool)
            .await
            .with_context(|| format!("Post database at {} is read-only", path.display()))?;

        let stored = count_posts(&pool).await?;
        debug!(path = %path.display(), stored, "Opened post database");
        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections, checkpointing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Take and release the write lock; an already-migrated read-only file
/// would otherwise only fail on the first upsert.
async fn ensure_writable(pool: &SqlitePool) -> Result<()> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    sqlx::query("ROLLBACK").execute(&mut *conn).await?;
    Ok(())
}
