//! One complete run: collect, rank, store, log.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::pipeline::run_pipeline;
use crate::report::{OutputLocations, RunSummary};
use crate::source::PostSource;
use crate::storage::{append_run_log, StorageManager};

/// Run the whole flow once against `source`.
///
/// An empty result is not an error: nothing is stored, but the run log is
/// still written and the summary names where output would have gone.
///
/// # Errors
///
/// Returns an error if the source cannot collect at all or storage cannot be
/// opened or written.
pub async fn run_once<S>(config: &Config, source: &mut S) -> Result<RunSummary>
where
    S: PostSource + ?Sized,
{
    info!(
        keywords = config.keywords.len(),
        hashtags = config.hashtags.len(),
        days_limit = config.days_limit,
        "Starting run"
    );

    let raw = source
        .collect(&config.keywords, &config.hashtags)
        .await
        .context("Failed to collect posts")?;

    let output = run_pipeline(&raw, &config.keywords, config.days_limit());
    let locations = OutputLocations::from_config(&config.storage);

    let saved = if output.posts.is_empty() {
        warn!(
            emptied_at = ?output.stats.emptied_at().map(|stage| stage.to_string()),
            csv = %locations.csv.display(),
            db = %locations.db.display(),
            "No posts to save"
        );
        None
    } else {
        let storage = StorageManager::open(&config.storage)
            .await
            .context("Failed to open storage")?;
        let report = storage
            .save_posts(&output.posts, config.storage.append_csv)
            .await
            .context("Failed to save posts")?;
        storage.database().close().await;
        Some(report)
    };

    let summary = RunSummary::new(output, saved, locations, Utc::now());
    if let Err(e) = append_run_log(&config.storage.log_file, &summary.log_line(), Local::now()).await {
        warn!("Failed to write run log: {e:#}");
    }

    info!(
        total = summary.total(),
        top_score = summary.top_score(),
        matching = summary.matching(),
        "Run complete"
    );
    Ok(summary)
}
