//! Hiring post scraper library.
//!
//! Collects posts from a social feed and its content search, keeps the recent
//! ones, removes duplicates, ranks them by hiring-keyword relevance, and writes
//! them to CSV and SQLite.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod browser;
pub mod clean;
pub mod config;
pub mod constants;
pub mod date_filter;
pub mod dates;
pub mod db;
pub mod dedup;
pub mod extract;
pub mod pipeline;
pub mod post;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod scoring;
pub mod source;
pub mod storage;
pub mod text;
pub mod urls;
