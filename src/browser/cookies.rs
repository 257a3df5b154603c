//! Cookies exported from a logged-in browser, used to seed a fresh session.

use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Domain assumed for cookies exported without one.
const DEFAULT_COOKIE_DOMAIN: &str = ".linkedin.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    /// Case-insensitive; anything unrecognized or missing is `Lax`.
    fn from_raw(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_lowercase).as_deref() {
            Some("strict") => Self::Strict,
            Some("none") => Self::None,
            _ => Self::Lax,
        }
    }
}

/// A normalized session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub same_site: SameSite,
    /// Seconds since the epoch; `None` for a session cookie.
    pub expires: Option<f64>,
}

/// The shape written by browser cookie exporters and automation tools.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedCookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    secure: Option<bool>,
    http_only: Option<bool>,
    same_site: Option<Value>,
    #[serde(alias = "expirationDate")]
    expires: Option<f64>,
}

impl From<ExportedCookie> for SessionCookie {
    fn from(raw: ExportedCookie) -> Self {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        Self {
            name: raw.name,
            value: raw.value,
            domain: non_empty(raw.domain).unwrap_or_else(|| DEFAULT_COOKIE_DOMAIN.to_string()),
            path: non_empty(raw.path).unwrap_or_else(|| "/".to_string()),
            secure: raw.secure,
            http_only: raw.http_only,
            same_site: SameSite::from_raw(raw.same_site.as_ref()),
            expires: raw.expires.filter(|t| *t > 0.0),
        }
    }
}

impl From<&SessionCookie> for CookieParam {
    fn from(cookie: &SessionCookie) -> Self {
        let mut param = Self::new(cookie.name.clone(), cookie.value.clone());
        param.domain = Some(cookie.domain.clone());
        param.path = Some(cookie.path.clone());
        param.secure = cookie.secure;
        param.http_only = cookie.http_only;
        param.same_site = Some(match cookie.same_site {
            SameSite::Strict => CookieSameSite::Strict,
            SameSite::Lax => CookieSameSite::Lax,
            SameSite::None => CookieSameSite::None,
        });
        param.expires = cookie.expires.map(TimeSinceEpoch::new);
        param
    }
}

/// Parse an exported cookie list.
///
/// Accepts a bare JSON array or an object with a `cookies` array. Entries
/// missing a name or value are skipped.
///
/// # Errors
///
/// Returns an error if the text is not JSON or holds no cookie list.
pub fn parse_cookies(raw: &str) -> Result<Vec<SessionCookie>> {
    let entries = match serde_json::from_str::<Value>(raw).context("Cookie file is not valid JSON")? {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("cookies") {
            Some(Value::Array(entries)) => entries,
            _ => anyhow::bail!("Cookie file has no cookie list"),
        },
        _ => anyhow::bail!("Cookie file has no cookie list"),
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<ExportedCookie>(entry) {
            Ok(cookie) => Some(SessionCookie::from(cookie)),
            Err(e) => {
                debug!(index, "Skipping malformed cookie: {e}");
                None
            }
        })
        .collect())
}

/// Read and parse the cookie file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_cookies(path: &Path) -> Result<Vec<SessionCookie>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read cookies from {}", path.display()))?;
    parse_cookies(&raw).with_context(|| format!("Failed to parse cookies in {}", path.display()))
}
