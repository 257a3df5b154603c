use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::locators::{
    CounterSource, DateSource, Locator, PermalinkSource, AUTHOR_LINK, AUTHOR_NAME, BODY_TEXT,
    COMMENTS, DATE, LIKES, PERMALINK,
};
use super::Extract;
use crate::constants::{FEED_UPDATE_PREFIX, PLACEHOLDER_POST_PREFIX, UNKNOWN_AUTHOR};
use crate::dates::{parse_relative, parse_timestamp};
use crate::dedup::content_hash;
use crate::post::{DatePosted, PostRecord};
use crate::text::{normalize, snippet};
use crate::urls::canonicalize;

/// Hex characters of the content hash embedded in a synthesized permalink.
const SYNTHETIC_KEY_LEN: usize = 12;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());

static ACTIVITY_URN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"urn:li:activity:\d+").unwrap());

/// The outer HTML of one post container, as captured from the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostNode {
    html: String,
}

impl PostNode {
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }
}

impl Extract for PostNode {
    fn extract(&self, now: DateTime<Utc>) -> Option<PostRecord> {
        let fragment = Html::parse_fragment(&self.html);

        let text = find_body_text(&fragment);
        let post_url = match find_permalink(&fragment) {
            Some(url) => url,
            None if !text.is_empty() => synthesize_permalink(&text),
            None => return None,
        };

        let (author_url, author_name) = find_author(&fragment);
        let date_posted = find_date(&fragment, now);

        Some(PostRecord {
            post_url,
            author_url,
            author_name,
            text_snippet: snippet(&text),
            text,
            date_posted: Some(DatePosted::At(date_posted)),
            likes: find_counter(&fragment, &LIKES, &["reaction", "like"]),
            comments: find_counter(&fragment, &COMMENTS, &["comment"]),
            score: None,
        })
    }
}

/// Normalized text content of an element, with text nodes joined by spaces.
fn element_text(element: ElementRef<'_>) -> String {
    normalize(&element.text().collect::<Vec<_>>().join(" "))
}

fn select_first<'a, T>(
    fragment: &'a Html,
    selector: &Selector,
    read: impl FnMut(ElementRef<'a>) -> Option<T>,
) -> Option<T> {
    fragment.select(selector).find_map(read)
}

fn find_permalink(fragment: &Html) -> Option<String> {
    PERMALINK.iter().find_map(|locator| {
        select_first(fragment, &locator.selector, |el| match locator.source {
            PermalinkSource::Href => el
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(canonicalize),
            PermalinkSource::ActivityUrn(attr) => el
                .value()
                .attr(attr)
                .and_then(|value| ACTIVITY_URN.find(value))
                .map(|urn| format!("{FEED_UPDATE_PREFIX}{}", urn.as_str())),
        })
    })
}

fn synthesize_permalink(text: &str) -> String {
    let hash = content_hash(text);
    format!("{PLACEHOLDER_POST_PREFIX}{}", &hash[..SYNTHETIC_KEY_LEN])
}

fn find_body_text(fragment: &Html) -> String {
    BODY_TEXT
        .iter()
        .find_map(|selector| {
            select_first(fragment, selector, |el| {
                Some(element_text(el)).filter(|text| !text.is_empty())
            })
        })
        .unwrap_or_default()
}

/// Author profile URL and display name.
fn find_author(fragment: &Html) -> (String, String) {
    let Some((selector, href)) = AUTHOR_LINK.iter().find_map(|selector| {
        select_first(fragment, selector, |el| {
            el.value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(|href| (selector, href.to_string()))
        })
    }) else {
        return (String::new(), UNKNOWN_AUTHOR.to_string());
    };

    // The first matching link is often the avatar; take the name from any
    // link to the same profile, then from the dedicated name elements.
    let link_name = select_first(fragment, selector, |el| {
        (el.value().attr("href").map(str::trim) == Some(href.as_str()))
            .then(|| element_text(el))
            .filter(|name| !name.is_empty())
    });
    let name = link_name
        .or_else(|| {
            AUTHOR_NAME.iter().find_map(|name_selector| {
                select_first(fragment, name_selector, |el| {
                    Some(element_text(el)).filter(|name| !name.is_empty())
                })
            })
        })
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    (canonicalize(&href), name)
}

fn find_date(fragment: &Html, now: DateTime<Utc>) -> DateTime<Utc> {
    DATE.iter()
        .find_map(|locator| {
            select_first(fragment, &locator.selector, |el| match locator.source {
                DateSource::Attr(attr) => el.value().attr(attr).and_then(parse_timestamp),
                DateSource::RelativeText => parse_relative(&element_text(el), now),
            })
        })
        .unwrap_or(now)
}

/// First integer in `raw`, ignoring thousands separators.
fn first_integer(raw: &str) -> Option<u64> {
    INTEGER
        .find(raw)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

fn find_counter(fragment: &Html, table: &[Locator<CounterSource>], labels: &[&str]) -> u64 {
    table
        .iter()
        .find_map(|locator| {
            select_first(fragment, &locator.selector, |el| match locator.source {
                CounterSource::Text => first_integer(&element_text(el)),
                CounterSource::Attr(attr) => el.value().attr(attr).and_then(first_integer),
            })
        })
        .or_else(|| find_labelled_integer(fragment, labels))
        .unwrap_or(0)
}

/// Scan text nodes for one mentioning a label and carrying a number.
fn find_labelled_integer(fragment: &Html, labels: &[&str]) -> Option<u64> {
    fragment.root_element().text().find_map(|chunk| {
        let lower = chunk.to_lowercase();
        labels
            .iter()
            .any(|label| lower.contains(label))
            .then(|| first_integer(chunk))
            .flatten()
    })
}
