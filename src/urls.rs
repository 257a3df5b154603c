//! URL hygiene for permalinks and profile links.

use url::Url;

use crate::constants::BASE_URL;

/// Query parameters the platform appends for tracking.
const TRACKING_PARAMS: &[&str] = &[
    "trk",
    "trkinfo",
    "trackingid",
    "lipi",
    "midtoken",
    "midsig",
    "rcm",
    "refid",
    "originalsubdomain",
    "fbclid",
    "gclid",
    "ref",
    "ref_src",
    "source",
    "share",
];

/// Resolve `url` against the platform base URL if it is not already absolute.
///
/// Anything starting with `http` is left alone; empty input stays empty.
#[must_use]
pub fn absolutize(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http") {
        return url.to_string();
    }
    if url.starts_with('/') {
        format!("{BASE_URL}{url}")
    } else {
        format!("{BASE_URL}/{url}")
    }
}

/// Absolutize and drop tracking parameters and fragments.
///
/// Used when a link is first extracted so that the same post reached from the
/// feed and from search carries the same identity.
#[must_use]
pub fn canonicalize(url: &str) -> String {
    let absolute = absolutize(url);
    let Ok(mut parsed) = Url::parse(&absolute) else {
        return absolute;
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return absolute;
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.set_fragment(None);

    parsed.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_lowercase();
    TRACKING_PARAMS.contains(&lower.as_str()) || lower.starts_with("utm_")
}
