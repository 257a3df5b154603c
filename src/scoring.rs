//! Keyword relevance scoring.

use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Compiled keyword matcher.
///
/// Each keyword becomes a case-insensitive whole-word pattern; the score of a
/// text is the total number of non-overlapping matches across all keywords.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    patterns: Vec<Regex>,
}

impl KeywordScorer {
    /// Compile a scorer for the given keywords. Blank keywords are ignored.
    #[must_use]
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let patterns = keywords
            .iter()
            .map(AsRef::as_ref)
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .filter_map(|kw| {
                let pattern = format!(r"\b{}\b", regex::escape(kw));
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        debug!(keyword = %kw, error = %e, "Skipping keyword that does not compile");
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Number of keyword matches in `text`.
    #[must_use]
    pub fn score(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        self.patterns
            .iter()
            .map(|re| re.find_iter(text).count() as u32)
            .sum()
    }

    /// Whether no usable keyword was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Score `text` against `keywords` in one shot.
#[must_use]
pub fn score<S: AsRef<str>>(text: &str, keywords: &[S]) -> u32 {
    if text.is_empty() || keywords.is_empty() {
        return 0;
    }
    KeywordScorer::new(keywords).score(text)
}
