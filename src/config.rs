use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;
use thiserror::Error;

use crate::schedule::ScheduleMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from a TOML file, with environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Terms searched for and scored against.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Terms searched for only; they do not contribute to the score.
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Keep posts from the last N days; 0 disables the filter.
    #[serde(default = "default_days_limit")]
    pub days_limit: i64,
    /// Read raw post mappings from this JSON file instead of driving a browser.
    #[serde(default)]
    pub raw_posts_file: Option<PathBuf>,
    #[serde(default)]
    pub scraping: ScrapingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub headless: bool,
    pub delay_between_requests_secs: u64,
    /// Maximum number of post containers taken from one page.
    pub max_posts_per_search: usize,
    pub timeout_ms: u64,
    /// Optional cap on raw units collected per run.
    pub max_total_posts: Option<usize>,
    pub feed_scrolls: u32,
    pub search_scrolls: u32,
    pub chrome_path: Option<String>,
    /// Persistent browser profile directory holding the login session.
    pub profile_dir: Option<PathBuf>,
    /// Exported cookies (JSON) added to the browser after launch.
    pub cookies_file: Option<PathBuf>,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            headless: false,
            delay_between_requests_secs: 2,
            max_posts_per_search: 50,
            timeout_ms: 30_000,
            max_total_posts: None,
            feed_scrolls: 5,
            search_scrolls: 3,
            chrome_path: None,
            profile_dir: None,
            cookies_file: None,
        }
    }
}

impl ScrapingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_secs(self.delay_between_requests_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub csv_file: PathBuf,
    pub db_file: PathBuf,
    pub log_file: PathBuf,
    /// Append to an existing CSV instead of overwriting it.
    pub append_csv: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            csv_file: PathBuf::from("output.csv"),
            db_file: PathBuf::from("output.db"),
            log_file: PathBuf::from("logs/last_run.txt"),
            append_csv: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    #[default]
    Once,
    Interval,
    Daily,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub mode: ScheduleKind,
    pub interval_minutes: u64,
    /// Local time of day, `HH:MM`.
    pub daily_at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            mode: ScheduleKind::Once,
            interval_minutes: 360,
            daily_at: "09:00".to_string(),
        }
    }
}

const fn default_days_limit() -> i64 {
    7
}

impl Config {
    /// Load the file named by `SCRAPER_CONFIG` (default `config.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env_or_default("SCRAPER_CONFIG", "config.toml");
        Self::load(Path::new(&path))
    }

    /// Load configuration from a TOML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrongly typed fields.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(val) = optional_env("DAYS_LIMIT") {
            self.days_limit = val.parse().map_err(|e| ConfigError::ParseInt {
                name: "DAYS_LIMIT".to_string(),
                source: e,
            })?;
        }
        if let Some(val) = optional_env("HEADLESS") {
            self.scraping.headless = parse_bool("HEADLESS", &val)?;
        }
        if let Some(val) = optional_env("CHROME_PATH") {
            self.scraping.chrome_path = Some(val);
        }
        if let Some(val) = optional_env("COOKIES_FILE") {
            self.scraping.cookies_file = Some(PathBuf::from(val));
        }
        if let Some(val) = optional_env("RAW_POSTS_FILE") {
            self.raw_posts_file = Some(PathBuf::from(val));
        }
        if let Some(val) = optional_env("CSV_FILE") {
            self.storage.csv_file = PathBuf::from(val);
        }
        if let Some(val) = optional_env("DB_FILE") {
            self.storage.db_file = PathBuf::from(val);
        }
        if let Some(val) = optional_env("LOG_FILE") {
            self.storage.log_file = PathBuf::from(val);
        }
        Ok(())
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraping.max_posts_per_search == 0 {
            return Err(ConfigError::InvalidValue {
                name: "scraping.max_posts_per_search".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.scraping.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "scraping.timeout_ms".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        self.schedule_mode()?;
        Ok(())
    }

    /// The recency limit, or `None` when filtering is disabled.
    #[must_use]
    pub fn days_limit(&self) -> Option<i64> {
        (self.days_limit > 0).then_some(self.days_limit)
    }

    /// Resolve the `[schedule]` section.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero interval or an unparseable time of day.
    pub fn schedule_mode(&self) -> Result<ScheduleMode, ConfigError> {
        match self.schedule.mode {
            ScheduleKind::Once => Ok(ScheduleMode::Once),
            ScheduleKind::Interval => {
                let minutes = self.schedule.interval_minutes;
                if minutes == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "schedule.interval_minutes".to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
                let secs = minutes.checked_mul(60).ok_or_else(|| ConfigError::InvalidValue {
                    name: "schedule.interval_minutes".to_string(),
                    message: format!("{minutes} minutes is too long"),
                })?;
                Ok(ScheduleMode::Interval(Duration::from_secs(secs)))
            }
            ScheduleKind::Daily => NaiveTime::parse_from_str(self.schedule.daily_at.trim(), "%H:%M")
                .map(ScheduleMode::Daily)
                .map_err(|e| ConfigError::InvalidValue {
                    name: "schedule.daily_at".to_string(),
                    message: format!("expected HH:MM, got '{}': {e}", self.schedule.daily_at),
                }),
        }
    }

    /// A configuration writing all output under `dir`, for tests.
    #[must_use]
    pub fn for_testing(dir: &Path) -> Self {
        Self {
            keywords: vec!["hiring".to_string()],
            hashtags: Vec::new(),
            days_limit: 0,
            raw_posts_file: None,
            scraping: ScrapingConfig {
                headless: true,
                delay_between_requests_secs: 0,
                profile_dir: Some(dir.join("profile")),
                ..ScrapingConfig::default()
            },
            storage: StorageConfig {
                csv_file: dir.join("output.csv"),
                db_file: dir.join("output.db"),
                log_file: dir.join("logs").join("last_run.txt"),
                append_csv: false,
            },
            schedule: ScheduleConfig::default(),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_string())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
