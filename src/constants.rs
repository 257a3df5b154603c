//! Shared constants used across the application.

/// Base URL of the platform. Relative links found in posts are resolved against it.
pub const BASE_URL: &str = "https://www.linkedin.com";

/// Prefix for identity URLs synthesized from a content hash when a post has no permalink.
pub const PLACEHOLDER_POST_PREFIX: &str = "https://www.linkedin.com/feed/post/";

/// Prefix used to build permalinks from an activity URN.
pub const FEED_UPDATE_PREFIX: &str = "https://www.linkedin.com/feed/update/";

/// Maximum length (in characters) of `text_snippet`, before the ellipsis.
pub const SNIPPET_MAX_LEN: usize = 200;

/// Author name used when no author link could be located.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// User agent string used by the browser driver.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
