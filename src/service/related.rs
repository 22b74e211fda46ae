//! Related-content selection
//!
//! Records sharing a tag with the target come first, newest first; the rest
//! of the slots are filled with the newest remaining records. Equal dates keep
//! their incoming pool order.

use super::listing::{Listable, SortBy, sort_items};

pub fn related<T: Listable + Clone>(target: &T, pool: &[T], limit: usize) -> Vec<T> {
    let eligible: Vec<&T> = pool
        .iter()
        .filter(|item| item.status().is_published() && item.id() != target.id())
        .collect();

    let shares_tag = |item: &T| item.tags().iter().any(|tag| target.tags().contains(tag));

    let mut matches: Vec<T> = eligible
        .iter()
        .copied()
        .filter(|item| shares_tag(*item))
        .cloned()
        .collect();
    sort_items(&mut matches, SortBy::Newest);
    matches.truncate(limit);

    if matches.len() < limit {
        let mut rest: Vec<T> = eligible
            .iter()
            .copied()
            .filter(|item| !matches.iter().any(|chosen| chosen.id() == item.id()))
            .cloned()
            .collect();
        sort_items(&mut rest, SortBy::Newest);
        let missing = limit - matches.len();
        matches.extend(rest.into_iter().take(missing));
    }

    matches
}
