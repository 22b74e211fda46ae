//! Data models
//!
//! Rust structs representing catalog documents.
//! All models use ULID for IDs and chrono for timestamps, and serialize with
//! camelCase field names so stored documents match the JSON API.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Named document collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Models,
    Videos,
    Galleries,
    Profiles,
    Users,
    Tags,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Videos => "videos",
            Self::Galleries => "galleries",
            Self::Profiles => "profiles",
            Self::Users => "users",
            Self::Tags => "tags",
        }
    }

    /// Collections whose documents feed the tag registry
    pub fn counts_tags(&self) -> bool {
        matches!(self, Self::Videos | Self::Galleries)
    }
}

/// A typed record stored in one collection
pub trait Document: Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

// =============================================================================
// Publication status
// =============================================================================

/// Visibility of a catalog record
///
/// Draft and Published are the only states; admins move records both ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PublishStatus {
    Published,
    #[default]
    Draft,
}

impl PublishStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

// =============================================================================
// Catalog entities
// =============================================================================

/// A catalog model (person featured in content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Derived from name and category on every save
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bust: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hips: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub famous_for: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Model {
    const COLLECTION: Collection = Collection::Models;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Poster image URL
    pub image: String,
    pub video_url: String,
    /// Model names appearing in the video
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Derived search terms, never accepted from input
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub is_featured: bool,
    pub date: DateTime<Utc>,
    /// Length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Document for Video {
    const COLLECTION: Collection = Collection::Videos;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A photo gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Cover image URL
    pub image: String,
    /// Ordered image URLs
    #[serde(default)]
    pub album: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub status: PublishStatus,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Document for Gallery {
    const COLLECTION: Collection = Collection::Galleries;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Gallery {
    /// Expand the album into addressable photos.
    pub fn photos(&self) -> Vec<Photo> {
        self.album
            .iter()
            .enumerate()
            .map(|(index, url)| Photo {
                id: Photo::id_for(&self.id, index),
                image: url.clone(),
                title: format!("{} - Photo {}", self.title, index + 1),
                gallery_id: self.id.clone(),
                gallery_title: self.title.clone(),
            })
            .collect()
    }
}

/// A single album image, addressed as `<galleryId>-photo-<index>`
///
/// Never stored; derived from its gallery on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub image: String,
    pub title: String,
    pub gallery_id: String,
    pub gallery_title: String,
}

impl Photo {
    const SEPARATOR: &'static str = "-photo-";

    pub fn id_for(gallery_id: &str, index: usize) -> String {
        format!("{gallery_id}{}{index}", Self::SEPARATOR)
    }

    /// Split a photo id into gallery id and album index.
    pub fn parse_id(id: &str) -> Option<(&str, usize)> {
        let (gallery_id, index) = id.rsplit_once(Self::SEPARATOR)?;
        if gallery_id.is_empty() {
            return None;
        }
        Some((gallery_id, index.parse().ok()?))
    }
}

// =============================================================================
// Hero profiles
// =============================================================================

/// Slot an image occupies in a hero profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Background,
    Main,
    Carousel,
}

/// Image belonging to a hero profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelImage {
    pub id: String,
    pub model_profile_id: String,
    pub image_type: ImageType,
    /// 1-10, carousel images only
    pub image_position: Option<u8>,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Marketing profile driving the homepage hero carousel
///
/// Separate from the catalog [`Model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ModelImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for ModelProfile {
    const COLLECTION: Collection = Collection::Profiles;

    fn id(&self) -> &str {
        &self.id
    }
}

impl ModelProfile {
    pub fn image_of(&self, image_type: ImageType) -> Option<&ModelImage> {
        self.images.iter().find(|image| image.image_type == image_type)
    }

    /// Carousel images ordered by position.
    pub fn carousel(&self) -> Vec<&ModelImage> {
        let mut carousel: Vec<&ModelImage> = self
            .images
            .iter()
            .filter(|image| image.image_type == ImageType::Carousel)
            .collect();
        carousel.sort_by_key(|image| image.image_position.unwrap_or(0));
        carousel
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Kind of content a favorite points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    Video,
    Gallery,
    Photo,
}

/// Reference to a favorited item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FavoriteKind,
}

/// One watched video, newest entries first in [`User::watch_history`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
    #[serde(default)]
    pub watch_history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Tag registry
// =============================================================================

/// Global tag usage counters
///
/// Count for a tag equals the number of videos and galleries listing it.
/// Tags whose count drops to zero are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRegistry(pub BTreeMap<String, i64>);

impl TagRegistry {
    pub fn count(&self, tag: &str) -> i64 {
        self.0.get(tag).copied().unwrap_or(0)
    }

    pub fn apply(&mut self, delta: &TagDelta) {
        for tag in &delta.added {
            *self.0.entry(tag.clone()).or_insert(0) += 1;
        }
        for tag in &delta.removed {
            if let Some(count) = self.0.get_mut(tag) {
                *count -= 1;
                if *count <= 0 {
                    self.0.remove(tag);
                }
            }
        }
    }

    /// Rebuild counters from the tag lists of every content item.
    #[cfg(test)]
    pub fn recount<'a>(tag_lists: impl IntoIterator<Item = &'a [String]>) -> Self {
        let mut registry = Self::default();
        for tags in tag_lists {
            registry.apply(&TagDelta::between(&[], tags));
        }
        registry
    }
}

/// Tags attached and detached by one save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl TagDelta {
    pub fn between(old: &[String], new: &[String]) -> Self {
        let old: BTreeSet<&String> = old.iter().collect();
        let new: BTreeSet<&String> = new.iter().collect();
        Self {
            added: new.difference(&old).map(|tag| (*tag).clone()).collect(),
            removed: old.difference(&new).map(|tag| (*tag).clone()).collect(),
        }
    }

    /// Delta between two stored bodies; a missing body has no tags.
    pub fn between_documents(old: Option<&Value>, new: Option<&Value>) -> Self {
        Self::between(&document_tags(old), &document_tags(new))
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

fn document_tags(document: Option<&Value>) -> Vec<String> {
    document
        .and_then(|document| document.get("tags"))
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
