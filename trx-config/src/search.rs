//! Diacritic-insensitive search over property display text.
//!
//! Candidate text is normalized once, when a property is built; each query is
//! normalized the same way and split into keywords. A property matches when
//! any keyword occurs anywhere in its text. Results keep display order.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::data::property::Property;

/// Queries shorter than this, after trimming, match nothing.
pub const MIN_QUERY_LEN: usize = 3;

/// Lower-cases `text`, decomposes it (NFD) and drops combining marks.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Normalized, de-duplicated keywords of `query`, or none when it is too short.
pub fn keywords(query: &str) -> Vec<String> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }
    let mut words: Vec<String> = Vec::new();
    for word in normalize(query).split_whitespace() {
        if !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

/// Filters `properties` down to those matching `query`, preserving order.
pub fn search<'a>(properties: impl IntoIterator<Item = &'a Property>, query: &str) -> Vec<&'a Property> {
    let words = keywords(query);
    if words.is_empty() {
        return Vec::new();
    }
    properties
        .into_iter()
        .filter(|p| words.iter().any(|w| p.search_text().contains(w.as_str())))
        .collect()
}
