//! Turning a rendered page into raw post units.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::constants::BASE_URL;
use crate::extract::RawUnit;

/// Divs considered by the class-name fallback.
const FALLBACK_SCAN_LIMIT: usize = 50;

/// Post container selectors, most reliable first.
static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"div[data-id*="urn:li:activity"]"#,
        "div.feed-shared-update-v2",
        "article.feed-shared-update-v2",
        r#"div[data-urn*="urn:li:activity"]"#,
        "div.update-components-actor",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("Invalid container selector"))
    .collect()
});

static CLASSED_DIV: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class]").expect("Invalid selector"));

#[must_use]
pub fn feed_url() -> String {
    format!("{BASE_URL}/feed/")
}

#[must_use]
pub fn login_url() -> String {
    format!("{BASE_URL}/login")
}

/// Content search URL for one term; `#` and spaces are percent-encoded.
#[must_use]
pub fn search_url(term: &str) -> String {
    format!(
        "{BASE_URL}/search/results/content/?keywords={}",
        urlencoding::encode(term.trim())
    )
}

/// Terms to search, keywords first then hashtags, without blanks or repeats.
#[must_use]
pub fn search_terms<'a>(keywords: &'a [String], hashtags: &'a [String]) -> Vec<&'a str> {
    let mut terms: Vec<&str> = Vec::new();
    for term in keywords.iter().chain(hashtags).map(|t| t.trim()) {
        if !term.is_empty() && !terms.iter().any(|seen| seen.eq_ignore_ascii_case(term)) {
            terms.push(term);
        }
    }
    terms
}

/// Whether the browser ended up on a sign-in or verification wall.
#[must_use]
pub fn is_login_wall(url: &str) -> bool {
    let lower = url.to_lowercase();
    ["/login", "/checkpoint", "/authwall", "/uas/"]
        .iter()
        .any(|marker| lower.contains(marker))
}

fn looks_like_post(element: &ElementRef<'_>) -> bool {
    element.value().attr("class").is_some_and(|class| {
        let class = class.to_lowercase();
        ["feed", "update", "post"].iter().any(|hint| class.contains(hint))
    })
}

/// Split page HTML into at most `max` post containers.
///
/// The first container selector with any match wins. When none matches, the
/// first divs whose class mentions feed/update/post are used instead.
#[must_use]
pub fn split_post_containers(html: &str, max: usize) -> Vec<RawUnit> {
    let document = Html::parse_document(html);

    let matched: Vec<ElementRef<'_>> = CONTAINERS
        .iter()
        .map(|selector| document.select(selector).take(max).collect::<Vec<_>>())
        .find(|elements| !elements.is_empty())
        .unwrap_or_else(|| {
            document
                .select(&CLASSED_DIV)
                .take(FALLBACK_SCAN_LIMIT)
                .filter(looks_like_post)
                .take(max)
                .collect()
        });

    matched
        .into_iter()
        .map(|element| RawUnit::node(element.html()))
        .collect()
}
