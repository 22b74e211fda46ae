//! Keyword search across the catalog

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::listing::{SortBy, published, sort_items};
use crate::data::{ContentRepository, Gallery, Model, RepositoryExt, Video};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    All,
    Videos,
    Galleries,
    Models,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub kind: SearchType,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub videos: Vec<Video>,
    pub galleries: Vec<Gallery>,
    pub models: Vec<Model>,
}

/// Terms every result must carry in its keyword set.
pub fn search_terms(query: &str, category: Option<&str>) -> Vec<String> {
    let mut terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty() && *c != "all") {
        terms.push(category.to_lowercase());
    }
    terms
}

fn has_all_terms(keywords: &std::collections::BTreeSet<String>, terms: &[String]) -> bool {
    terms.iter().all(|term| keywords.contains(term))
}

/// Run a search over already loaded collections.
pub fn run(
    query: &SearchQuery,
    videos: &[Video],
    galleries: &[Gallery],
    models: &[Model],
) -> SearchResults {
    let terms = search_terms(&query.q, query.category.as_deref());
    let needle = query.q.trim().to_lowercase();
    let mut results = SearchResults::default();

    if matches!(query.kind, SearchType::All | SearchType::Videos) {
        results.videos = published(videos)
            .into_iter()
            .filter(|video| has_all_terms(&video.keywords, &terms))
            .collect();
        sort_items(&mut results.videos, SortBy::Newest);
    }

    if matches!(query.kind, SearchType::All | SearchType::Galleries) {
        results.galleries = published(galleries)
            .into_iter()
            .filter(|gallery| has_all_terms(&gallery.keywords, &terms))
            .collect();
        sort_items(&mut results.galleries, SortBy::Newest);
    }

    let list_models = match query.kind {
        SearchType::Models => true,
        SearchType::All => !needle.is_empty(),
        _ => false,
    };
    if list_models {
        results.models = published(models)
            .into_iter()
            .filter(|model| model.name.to_lowercase().contains(&needle))
            .collect();
    }

    results
}

pub struct SearchService {
    repo: Arc<dyn ContentRepository>,
}

impl SearchService {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults, AppError> {
        let videos = self.repo.list::<Video>().await?;
        let galleries = self.repo.list::<Gallery>().await?;
        let models = self.repo.list::<Model>().await?;

        let results = run(query, &videos, &galleries, &models);
        tracing::debug!(
            query = %query.q,
            videos = results.videos.len(),
            galleries = results.galleries.len(),
            models = results.models.len(),
            "Search completed"
        );
        Ok(results)
    }
}
