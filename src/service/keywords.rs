//! Keyword and tag derivation
//!
//! Keyword sets are rebuilt from scratch on every save and never accepted
//! from client input.

use std::collections::BTreeSet;

/// Split a comma-separated tag string into normalised tags.
///
/// Tags are trimmed and lower-cased; empties are dropped and duplicates keep
/// their first position.
pub fn parse_tags(csv: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    csv.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Keyword set of a video or gallery.
///
/// Union of the lower-cased title words, lower-cased model names and tags.
pub fn derive_keywords(title: &str, models: &[String], tags: &[String]) -> BTreeSet<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .chain(models.iter().map(|model| model.trim().to_lowercase()))
        .chain(tags.iter().cloned())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// Keyword set of a catalog model: name words plus category.
pub fn model_keywords(name: &str, category: Option<&str>) -> BTreeSet<String> {
    name.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .chain(category.map(|category| category.trim().to_lowercase()))
        .filter(|keyword| !keyword.is_empty())
        .collect()
}
