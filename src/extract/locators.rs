//! Candidate locators for each post field, tried in order.
//!
//! Adding a locator means adding a row here; the extraction code only walks
//! the tables.

use std::sync::LazyLock;

use scraper::Selector;

/// How a permalink is read from a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermalinkSource {
    /// The element's `href`.
    Href,
    /// An activity URN stored in the named attribute.
    ActivityUrn(&'static str),
}

/// How a publication date is read from a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// A machine-readable absolute timestamp in the named attribute.
    Attr(&'static str),
    /// A relative phrase in the element text ("3 days ago", "2h").
    RelativeText,
}

/// How an engagement counter is read from a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSource {
    Text,
    Attr(&'static str),
}

/// A compiled selector paired with how to read its matches.
#[derive(Debug)]
pub struct Locator<K> {
    pub selector: Selector,
    pub source: K,
}

fn compile<K: Copy>(table: &[(&str, K)]) -> Vec<Locator<K>> {
    table
        .iter()
        .map(|&(css, source)| Locator {
            selector: Selector::parse(css).expect("Invalid locator selector"),
            source,
        })
        .collect()
}

fn compile_plain(table: &[&str]) -> Vec<Selector> {
    table
        .iter()
        .map(|css| Selector::parse(css).expect("Invalid locator selector"))
        .collect()
}

pub static PERMALINK: LazyLock<Vec<Locator<PermalinkSource>>> = LazyLock::new(|| {
    compile(&[
        (r#"a[href*="/posts/"]"#, PermalinkSource::Href),
        (r#"a[href*="/feed/update/"]"#, PermalinkSource::Href),
        (r#"[data-urn*="urn:li:activity"]"#, PermalinkSource::ActivityUrn("data-urn")),
        (r#"[data-id*="urn:li:activity"]"#, PermalinkSource::ActivityUrn("data-id")),
    ])
});

pub static AUTHOR_LINK: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_plain(&[r#"a[href*="/in/"]"#, r#"a[href*="/company/"]"#])
});

/// Name-bearing elements tried when the author link itself has no text.
pub static AUTHOR_NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_plain(&[
        r#".update-components-actor__title span[aria-hidden="true"]"#,
        ".update-components-actor__name",
        ".feed-shared-actor__name",
    ])
});

/// Body text, most specific container first.
pub static BODY_TEXT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_plain(&[
        "div.feed-shared-update-v2__description",
        "div.update-components-text",
        r#"span[dir="ltr"]"#,
        "div.feed-shared-text-view",
        r#"div[class*="text"]"#,
    ])
});

pub static DATE: LazyLock<Vec<Locator<DateSource>>> = LazyLock::new(|| {
    compile(&[
        ("time[datetime]", DateSource::Attr("datetime")),
        ("time", DateSource::RelativeText),
        (".update-components-actor__sub-description", DateSource::RelativeText),
        (".feed-shared-actor__sub-description", DateSource::RelativeText),
    ])
});

pub static LIKES: LazyLock<Vec<Locator<CounterSource>>> = LazyLock::new(|| {
    compile(&[
        (r#"[class*="social-counts__reactions-count"]"#, CounterSource::Text),
        (r#"button[aria-label*="reaction"]"#, CounterSource::Attr("aria-label")),
        (r#"button[aria-label*="like"]"#, CounterSource::Attr("aria-label")),
        (r#"span[class*="reactions"]"#, CounterSource::Text),
    ])
});

pub static COMMENTS: LazyLock<Vec<Locator<CounterSource>>> = LazyLock::new(|| {
    compile(&[
        (r#"button[aria-label*="comment"]"#, CounterSource::Attr("aria-label")),
        (r#"[class*="social-counts__comments"]"#, CounterSource::Text),
        (r#"span[class*="comments"]"#, CounterSource::Text),
    ])
});
