use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

/// Append one timestamped line to the run log, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub async fn append_run_log(path: &Path, message: &str, at: DateTime<Local>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let line = format!("[{}] {message}\n", at.format("%Y-%m-%d %H:%M:%S"));
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open run log {}", path.display()))?;
    file.write_all(line.as_bytes())
        .await
        .context("Failed to write run log")?;
    file.flush().await.context("Failed to flush run log")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_appends_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("last_run.txt");
        let at = Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();

        append_run_log(&path, "Scraped 3 posts. Top score: 2", at).await.unwrap();
        append_run_log(&path, "Scraped 0 posts. Top score: 0", at).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "[2024-03-01 09:05:07] Scraped 3 posts. Top score: 2\n\
             [2024-03-01 09:05:07] Scraped 0 posts. Top score: 0\n"
        );
    }
}
