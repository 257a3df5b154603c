//! Whitespace normalization and display snippets.

use crate::constants::SNIPPET_MAX_LEN;

/// Collapse every run of whitespace (newlines included) into a single space
/// and trim both ends.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Snippet of `text` using the default maximum length.
#[must_use]
pub fn snippet(text: &str) -> String {
    snippet_with_len(text, SNIPPET_MAX_LEN)
}

/// Truncate `text` to at most `max_length` characters plus a trailing `"..."`.
///
/// When the last space inside the cut sits at or beyond 80% of `max_length`
/// the cut moves back to that space so a word is not split in half.
#[must_use]
pub fn snippet_with_len(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_length)
        .map_or(text.len(), |(idx, _)| idx);
    let mut truncated = &text[..cut];

    if let Some(space_byte) = truncated.rfind(' ') {
        let space_char = truncated[..space_byte].chars().count();
        if space_char * 5 >= max_length * 4 {
            truncated = &truncated[..space_byte];
        }
    }

    format!("{truncated}...")
}
