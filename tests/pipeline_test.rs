//! End-to-end tests for the ranking pipeline.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hiring_post_scraper::extract::RawUnit;
use hiring_post_scraper::pipeline::{run_pipeline_at, Stage};
use hiring_post_scraper::post::{DatePosted, RawPost};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn mapping(post_url: Option<&str>, text: &str) -> RawUnit {
    RawUnit::from(RawPost {
        post_url: post_url.map(str::to_string),
        text: Some(text.to_string()),
        ..Default::default()
    })
}

#[test]
fn test_duplicate_permalink_keeps_first() {
    let raw = vec![
        mapping(Some("/posts/1"), "We are hiring engineers"),
        mapping(Some("/posts/1"), "duplicate"),
    ];

    let output = run_pipeline_at(&raw, &["hiring"], Some(7), now());

    assert_eq!(output.posts.len(), 1);
    let post = &output.posts[0];
    assert_eq!(post.post_url, "https://www.linkedin.com/posts/1");
    assert_eq!(post.text, "We are hiring engineers");
    assert_eq!(post.score, Some(1));
}

#[test]
fn test_unit_without_text_or_permalink_is_dropped() {
    let raw = vec![
        mapping(None, ""),
        mapping(Some("/posts/2"), "Hiring a designer"),
    ];

    let output = run_pipeline_at(&raw, &["hiring"], None, now());

    assert_eq!(output.stats.raw, 2);
    assert_eq!(output.stats.adapted, 1);
    assert_eq!(output.posts.len(), 1);
    assert_eq!(output.posts[0].post_url, "https://www.linkedin.com/posts/2");
}

#[test]
fn test_identical_text_without_permalink_dedups_by_content() {
    let raw = vec![
        RawUnit::from(RawPost {
            text: Some("Hiring now".to_string()),
            author_name: Some("First".to_string()),
            ..Default::default()
        }),
        RawUnit::from(RawPost {
            text: Some("Hiring now".to_string()),
            author_name: Some("Second".to_string()),
            ..Default::default()
        }),
    ];

    let output = run_pipeline_at(&raw, &["hiring"], None, now());

    assert_eq!(output.posts.len(), 1);
    assert_eq!(output.posts[0].author_name, "First");
}

#[test]
fn test_date_limit_excludes_old_posts() {
    let old = RawUnit::from(RawPost {
        post_url: Some("/posts/old".to_string()),
        text: Some("We are hiring".to_string()),
        date_posted: Some(DatePosted::At(now() - Duration::days(10))),
        ..Default::default()
    });

    let filtered = run_pipeline_at(std::slice::from_ref(&old), &["hiring"], Some(7), now());
    assert!(filtered.posts.is_empty());
    assert_eq!(filtered.stats.emptied_at(), Some(Stage::DateFilter));

    let unfiltered = run_pipeline_at(&[old], &["hiring"], Some(0), now());
    assert_eq!(unfiltered.posts.len(), 1);
}

#[test]
fn test_ties_keep_input_order() {
    let raw = vec![
        mapping(Some("/posts/a"), "hiring hiring hiring"),
        mapping(Some("/posts/b"), "hiring"),
        mapping(Some("/posts/c"), "Hiring, hiring and more hiring"),
        mapping(Some("/posts/d"), "hiring and hiring"),
    ];

    let output = run_pipeline_at(&raw, &["hiring"], None, now());

    let ranked: Vec<(&str, Option<u32>)> = output
        .posts
        .iter()
        .map(|p| (p.post_url.trim_start_matches("https://www.linkedin.com/posts/"), p.score))
        .collect();
    assert_eq!(
        ranked,
        vec![("a", Some(3)), ("c", Some(3)), ("d", Some(2)), ("b", Some(1))]
    );
}

#[test]
fn test_hashtags_do_not_score_unless_keywords() {
    let raw = vec![mapping(Some("/posts/1"), "Join us! #hiring #remote")];
    let output = run_pipeline_at(&raw, &["remote"], None, now());
    assert_eq!(output.posts[0].score, Some(1));
}

#[test]
fn test_textual_dates_filtered_and_cleaned() {
    let raw = vec![
        RawUnit::from(RawPost {
            post_url: Some("/posts/recent".to_string()),
            text: Some("hiring".to_string()),
            date_posted: Some(DatePosted::Text("2024-02-28T08:00:00Z".to_string())),
            ..Default::default()
        }),
        RawUnit::from(RawPost {
            post_url: Some("/posts/stale".to_string()),
            text: Some("hiring".to_string()),
            date_posted: Some(DatePosted::Text("2024-01-02".to_string())),
            ..Default::default()
        }),
        RawUnit::from(RawPost {
            post_url: Some("/posts/unknown".to_string()),
            text: Some("hiring".to_string()),
            date_posted: Some(DatePosted::Text("sometime last spring".to_string())),
            ..Default::default()
        }),
    ];

    let output = run_pipeline_at(&raw, &["hiring"], Some(7), now());

    let urls: Vec<&str> = output.posts.iter().map(|p| p.post_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.linkedin.com/posts/recent",
            "https://www.linkedin.com/posts/unknown",
        ]
    );
    assert_eq!(
        output.posts[0].date_posted,
        Some(DatePosted::At(Utc.with_ymd_and_hms(2024, 2, 28, 8, 0, 0).unwrap()))
    );
    // unparseable dates fail open, then become the clean-up time
    assert_eq!(output.posts[1].date_posted, Some(DatePosted::At(now())));
}

#[test]
fn test_node_and_mapping_units_mix() {
    let raw = vec![
        RawUnit::node(
            r#"<div class="feed-shared-update-v2">
                 <a href="/in/jane/">Jane Doe</a>
                 <span dir="ltr">We're hiring Rust engineers</span>
                 <a href="/posts/jane_hiring-activity-1?trk=feed">view</a>
                 <time>1d</time>
               </div>"#,
        ),
        mapping(
            Some("https://www.linkedin.com/posts/jane_hiring-activity-1"),
            "same post via search",
        ),
    ];

    let output = run_pipeline_at(&raw, &["hiring"], Some(7), now());

    assert_eq!(output.posts.len(), 1);
    let post = &output.posts[0];
    assert_eq!(post.author_name, "Jane Doe");
    assert_eq!(post.author_url, "https://www.linkedin.com/in/jane/");
    assert_eq!(post.date_posted, Some(DatePosted::At(now() - Duration::days(1))));
}
