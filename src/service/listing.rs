//! Filter, sort and paginate pipeline
//!
//! Pure functions over anything [`Listable`]; the input is never modified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{Gallery, Model, PublishStatus, Video};

/// Fields the listing pipeline reads from a record
pub trait Listable {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> Option<&str>;
    fn date(&self) -> DateTime<Utc>;
    fn status(&self) -> PublishStatus;

    /// Length in seconds, if the record has one
    fn duration(&self) -> Option<f64> {
        None
    }

    /// Tags used for related-content matching
    fn tags(&self) -> &[String] {
        &[]
    }
}

impl Listable for Video {
    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
    fn status(&self) -> PublishStatus {
        self.status
    }
    fn duration(&self) -> Option<f64> {
        self.duration
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Listable for Gallery {
    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
    fn status(&self) -> PublishStatus {
        self.status
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Listable for Model {
    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
    fn date(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn status(&self) -> PublishStatus {
        self.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    Duration,
}

/// Listing parameters as received from the query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl ListQuery {
    pub fn page(page: usize, page_size: usize) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

fn matches_search<T: Listable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item.title().to_lowercase().contains(needle)
        || item.description().to_lowercase().contains(needle)
}

fn matches_category<T: Listable>(item: &T, category: Option<&str>) -> bool {
    match category {
        None | Some("") | Some("all") => true,
        Some(category) => item.category() == Some(category),
    }
}

/// Sort records in place with a stable sort.
pub fn sort_items<T: Listable>(items: &mut [T], sort_by: SortBy) {
    match sort_by {
        SortBy::Newest => items.sort_by(|a, b| b.date().cmp(&a.date())),
        SortBy::Oldest => items.sort_by_key(|item| item.date()),
        SortBy::Duration => items.sort_by(|a, b| {
            let a = a.duration().unwrap_or(0.0);
            let b = b.duration().unwrap_or(0.0);
            b.total_cmp(&a)
        }),
    }
}

/// Filter by search and category, sort, then cut out the requested page.
///
/// Page 0 counts as page 1 and a zero page size falls back to
/// `default_page_size`. A page past the end is empty, not an error.
pub fn paginate<T: Listable + Clone>(
    items: &[T],
    query: &ListQuery,
    default_page_size: usize,
) -> Page<T> {
    let needle = query
        .search
        .as_deref()
        .map(|search| search.trim().to_lowercase())
        .unwrap_or_default();

    let mut filtered: Vec<T> = items
        .iter()
        .filter(|item| matches_search(*item, &needle))
        .filter(|item| matches_category(*item, query.category.as_deref()))
        .cloned()
        .collect();
    sort_items(&mut filtered, query.sort_by);

    let page_size = match query.page_size {
        Some(size) if size > 0 => size,
        _ => default_page_size,
    };
    page_of(filtered, query.page.unwrap_or(1), page_size)
}

/// Cut one page out of already ordered records.
///
/// Page 0 counts as page 1 and a zero page size as 1. A page past the end,
/// however large, is empty.
pub fn page_of<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total_pages,
        total_items,
    }
}

/// Keep only records visible on public pages.
pub fn published<T: Listable + Clone>(items: &[T]) -> Vec<T> {
    items
        .iter()
        .filter(|item| item.status().is_published())
        .cloned()
        .collect()
}
