use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::cookies::{load_cookies, SessionCookie};

/// Directory name used under `$HOME` when no profile directory is configured.
pub const DEFAULT_PROFILE_DIR: &str = ".linkedin_scraper_browser";

/// Lock artifacts a crashed Chromium leaves behind, which make the next launch
/// treat the profile as in use.
const SINGLETON_ARTIFACTS: [&str; 3] = ["SingletonLock", "SingletonCookie", "SingletonSocket"];

/// Where the logged-in browser session lives between runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Make the session usable and return the browser user-data directory.
    async fn prepare(&self) -> Result<PathBuf>;

    /// Whether a previous run left a session behind.
    fn has_saved_session(&self) -> bool;

    /// Cookies to add once the browser is up.
    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        Ok(Vec::new())
    }
}

/// A persistent Chromium user-data directory, optionally seeded from an
/// exported cookie file.
#[derive(Debug, Clone)]
pub struct ProfileDirSession {
    dir: PathBuf,
    cookies_file: Option<PathBuf>,
}

impl ProfileDirSession {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: expand_home(&dir.into()),
            cookies_file: None,
        }
    }

    #[must_use]
    pub fn with_cookies_file(mut self, path: Option<&Path>) -> Self {
        self.cookies_file = path.map(expand_home);
        self
    }

    /// The configured directory, or `~/.linkedin_scraper_browser`.
    #[must_use]
    pub fn from_config(dir: Option<&Path>) -> Self {
        dir.map_or_else(
            || Self::new(Path::new("~").join(DEFAULT_PROFILE_DIR)),
            Self::new,
        )
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SessionStore for ProfileDirSession {
    async fn prepare(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create profile directory {}", self.dir.display()))?;

        for name in SINGLETON_ARTIFACTS {
            if tokio::fs::remove_file(self.dir.join(name)).await.is_ok() {
                debug!(artifact = name, "Removed stale browser lock");
            }
        }

        Ok(self.dir.clone())
    }

    fn has_saved_session(&self) -> bool {
        self.dir.join("Default").is_dir() || self.cookies_file.as_deref().is_some_and(Path::is_file)
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        match &self.cookies_file {
            Some(path) => load_cookies(path).await,
            None => Ok(Vec::new()),
        }
    }
}

/// Replace a leading `~` with `$HOME`; other paths are returned unchanged.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_expand_home() {
        let original = std::env::var_os("HOME");
        std::env::set_var("HOME", "/home/tester");

        assert_eq!(
            expand_home(Path::new("~/.profile_dir")),
            PathBuf::from("/home/tester/.profile_dir")
        );
        assert_eq!(expand_home(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
        assert_eq!(expand_home(Path::new("rel/~dir")), PathBuf::from("rel/~dir"));
        assert_eq!(
            ProfileDirSession::from_config(None).dir(),
            Path::new("/home/tester").join(DEFAULT_PROFILE_DIR)
        );

        match original {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }
    }

    #[tokio::test]
    async fn test_prepare_creates_dir_and_clears_locks() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("profile");
        std::fs::create_dir_all(dir.join("Default")).unwrap();
        std::fs::write(dir.join("SingletonLock"), b"").unwrap();
        std::fs::write(dir.join("SingletonSocket"), b"").unwrap();
        std::fs::write(dir.join("Local State"), b"{}").unwrap();

        let session = ProfileDirSession::new(&dir);
        assert!(session.has_saved_session());
        let prepared = session.prepare().await.unwrap();

        assert_eq!(prepared, dir);
        assert!(!dir.join("SingletonLock").exists());
        assert!(!dir.join("SingletonSocket").exists());
        assert!(dir.join("Local State").exists());
    }

    #[tokio::test]
    async fn test_cookies_from_configured_file() {
        let temp = TempDir::new().unwrap();
        let session = ProfileDirSession::new(temp.path().join("profile"));
        assert!(session.cookies().await.unwrap().is_empty());

        let path = temp.path().join("cookies.json");
        std::fs::write(&path, r#"[{"name": "li_at", "value": "token", "sameSite": "strict"}]"#)
            .unwrap();
        let session = session.with_cookies_file(Some(&path));
        assert!(session.has_saved_session());

        let cookies = session.cookies().await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "li_at");
        assert_eq!(cookies[0].domain, ".linkedin.com");

        let broken = ProfileDirSession::new(temp.path().join("profile"))
            .with_cookies_file(Some(&temp.path().join("missing.json")));
        assert!(!broken.has_saved_session());
        assert!(broken.cookies().await.is_err());
    }

    #[tokio::test]
    async fn test_prepare_fresh_profile() {
        let temp = TempDir::new().unwrap();
        let session = ProfileDirSession::new(temp.path().join("new-profile"));
        assert!(!session.has_saved_session());
        session.prepare().await.unwrap();
        assert!(session.dir().is_dir());
    }
}
