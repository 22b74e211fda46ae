//! Video and gallery administration
//!
//! Every save rebuilds the keyword set. The repository adjusts the tag
//! registry against the stored record when the batch commits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::keywords::{derive_keywords, parse_tags};
use super::listing::{ListQuery, Page, SortBy, paginate};
use super::validation::FieldCheck;
use crate::data::{
    ContentRepository, Document, EntityId, Gallery, PublishStatus, RepositoryExt, Video,
    WriteBatch,
};
use crate::error::AppError;
use crate::events::{ChangeAction, ChangeFeed};

/// Video form as submitted by an admin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    pub video_url: String,
    #[serde(default)]
    pub models: Vec<String>,
    /// Comma-separated
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Gallery form as submitted by an admin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub album: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

fn clean_models(models: &[String]) -> Vec<String> {
    models
        .iter()
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .collect()
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_common(check: &mut FieldCheck, title: &str, image: &str, models: &[String]) {
    check.length("title", title, 2, 100);
    check.url("image", image);
    check.require(
        "models",
        !clean_models(models).is_empty(),
        "Select at least one model",
    );
}

impl VideoInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut check = FieldCheck::new();
        check_common(&mut check, &self.title, &self.image, &self.models);
        check.url("videoUrl", &self.video_url);
        if let Some(duration) = self.duration {
            check.require(
                "duration",
                duration.is_finite() && duration >= 0.0,
                "Must be a positive number of seconds",
            );
        }
        check.finish()
    }

    fn into_video(self, id: String, date: DateTime<Utc>) -> Video {
        let models = clean_models(&self.models);
        let tags = parse_tags(&self.tags);
        let title = self.title.trim().to_string();
        Video {
            keywords: derive_keywords(&title, &models, &tags),
            id,
            title,
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            video_url: self.video_url.trim().to_string(),
            models,
            tags,
            status: self.status,
            is_featured: self.is_featured,
            date: self.date.unwrap_or(date),
            duration: self.duration,
            resolution: clean_optional(self.resolution),
            file_size: clean_optional(self.file_size),
            category: clean_optional(self.category),
        }
    }
}

impl GalleryInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut check = FieldCheck::new();
        check_common(&mut check, &self.title, &self.image, &self.models);
        for (index, url) in self.album.iter().enumerate() {
            if !super::validation::is_url(url) {
                check.fail(&format!("album.{index}"), "Must be a valid URL");
            }
        }
        check.finish()
    }

    fn into_gallery(self, id: String, date: DateTime<Utc>) -> Gallery {
        let models = clean_models(&self.models);
        let tags = parse_tags(&self.tags);
        let title = self.title.trim().to_string();
        Gallery {
            keywords: derive_keywords(&title, &models, &tags),
            id,
            title,
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            album: self.album.iter().map(|url| url.trim().to_string()).collect(),
            models,
            tags,
            status: self.status,
            date: self.date.unwrap_or(date),
            resolution: clean_optional(self.resolution),
            category: clean_optional(self.category),
        }
    }
}

/// Admin operations on videos and galleries
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    events: ChangeFeed,
    page_size: usize,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepository>, events: ChangeFeed, page_size: usize) -> Self {
        Self {
            repo,
            events,
            page_size,
        }
    }

    async fn save<D: Document>(&self, document: &D, action: ChangeAction) -> Result<(), AppError> {
        let batch = WriteBatch::new().put(document)?;
        self.repo.commit_timed(batch, D::COLLECTION).await?;
        self.events.publish(D::COLLECTION, action, Some(document.id()));
        tracing::info!(
            collection = D::COLLECTION.as_str(),
            id = document.id(),
            action = action.as_str(),
            "Content saved"
        );
        Ok(())
    }

    async fn delete<D: Document>(&self, id: &str) -> Result<(), AppError> {
        let batch = WriteBatch::new().delete::<D>(id);
        self.repo.commit_timed(batch, D::COLLECTION).await?;
        self.events
            .publish(D::COLLECTION, ChangeAction::Deleted, Some(id));
        tracing::info!(collection = D::COLLECTION.as_str(), id, "Content deleted");
        Ok(())
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// All videos regardless of status, newest first.
    pub async fn list_videos(&self, page: usize) -> Result<Page<Video>, AppError> {
        let videos = self.repo.list::<Video>().await?;
        Ok(paginate(
            &videos,
            &ListQuery {
                sort_by: SortBy::Newest,
                ..ListQuery::page(page, self.page_size)
            },
            self.page_size,
        ))
    }

    pub async fn get_video(&self, id: &str) -> Result<Video, AppError> {
        self.repo.get::<Video>(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create_video(&self, input: VideoInput) -> Result<Video, AppError> {
        input.validate()?;
        let video = input.into_video(EntityId::new().0, Utc::now());
        self.save(&video, ChangeAction::Created).await?;
        Ok(video)
    }

    /// Replace a video, keeping its id and, unless given, its date.
    pub async fn update_video(&self, id: &str, input: VideoInput) -> Result<Video, AppError> {
        input.validate()?;
        let existing = self.get_video(id).await?;
        let video = input.into_video(existing.id, existing.date);
        self.save(&video, ChangeAction::Updated).await?;
        Ok(video)
    }

    pub async fn delete_video(&self, id: &str) -> Result<(), AppError> {
        self.get_video(id).await?;
        self.delete::<Video>(id).await
    }

    // =========================================================================
    // Galleries
    // =========================================================================

    pub async fn list_galleries(&self, page: usize) -> Result<Page<Gallery>, AppError> {
        let galleries = self.repo.list::<Gallery>().await?;
        Ok(paginate(
            &galleries,
            &ListQuery::page(page, self.page_size),
            self.page_size,
        ))
    }

    pub async fn get_gallery(&self, id: &str) -> Result<Gallery, AppError> {
        self.repo
            .get::<Gallery>(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create_gallery(&self, input: GalleryInput) -> Result<Gallery, AppError> {
        input.validate()?;
        let gallery = input.into_gallery(EntityId::new().0, Utc::now());
        self.save(&gallery, ChangeAction::Created).await?;
        Ok(gallery)
    }

    pub async fn update_gallery(&self, id: &str, input: GalleryInput) -> Result<Gallery, AppError> {
        input.validate()?;
        let existing = self.get_gallery(id).await?;
        let gallery = input.into_gallery(existing.id, existing.date);
        self.save(&gallery, ChangeAction::Updated).await?;
        Ok(gallery)
    }

    pub async fn delete_gallery(&self, id: &str) -> Result<(), AppError> {
        self.get_gallery(id).await?;
        self.delete::<Gallery>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Database, InMemoryRepository, TagRegistry};

    fn service() -> (ContentService, Arc<dyn ContentRepository>) {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        (ContentService::new(repo.clone(), ChangeFeed::new(), 20), repo)
    }

    fn video_input(title: &str, tags: &str) -> VideoInput {
        VideoInput {
            title: title.to_string(),
            description: "Behind the scenes".to_string(),
            image: "https://cdn.example.com/poster.jpg".to_string(),
            video_url: "https://cdn.example.com/video.mp4".to_string(),
            models: vec!["Ava Stone".to_string()],
            tags: tags.to_string(),
            status: PublishStatus::Published,
            is_featured: false,
            date: None,
            duration: Some(120.0),
            resolution: None,
            file_size: None,
            category: None,
        }
    }

    fn gallery_input(title: &str, tags: &str) -> GalleryInput {
        GalleryInput {
            title: title.to_string(),
            description: String::new(),
            image: "https://cdn.example.com/cover.jpg".to_string(),
            album: vec!["https://cdn.example.com/1.jpg".to_string()],
            models: vec!["Ava Stone".to_string()],
            tags: tags.to_string(),
            status: PublishStatus::Draft,
            date: None,
            resolution: None,
            category: None,
        }
    }

    async fn recount(repo: &Arc<dyn ContentRepository>) -> TagRegistry {
        let videos = repo.list::<Video>().await.unwrap();
        let galleries = repo.list::<Gallery>().await.unwrap();
        TagRegistry::recount(
            videos
                .iter()
                .map(|v| v.tags.as_slice())
                .chain(galleries.iter().map(|g| g.tags.as_slice())),
        )
    }

    #[tokio::test]
    async fn create_derives_keywords_and_tags() {
        let (service, repo) = service();
        let video = service
            .create_video(video_input("Golden Hour", "Editorial, summer"))
            .await
            .unwrap();

        assert_eq!(video.tags, vec!["editorial", "summer"]);
        assert!(video.keywords.contains("golden"));
        assert!(video.keywords.contains("ava stone"));
        assert!(video.keywords.contains("editorial"));

        let registry = repo.tag_registry().await.unwrap();
        assert_eq!(registry.count("editorial"), 1);
    }

    #[tokio::test]
    async fn registry_matches_recount_after_edits() {
        let (service, repo) = service();
        let first = service
            .create_video(video_input("First", "a, b"))
            .await
            .unwrap();
        let second = service
            .create_video(video_input("Second", "b, c"))
            .await
            .unwrap();
        let gallery = service
            .create_gallery(gallery_input("Album", "c, d"))
            .await
            .unwrap();

        service
            .update_video(&first.id, video_input("First", "a, e"))
            .await
            .unwrap();
        service.delete_video(&second.id).await.unwrap();
        service
            .update_gallery(&gallery.id, gallery_input("Album", ""))
            .await
            .unwrap();

        let registry = repo.tag_registry().await.unwrap();
        assert_eq!(registry, recount(&repo).await);
        assert_eq!(registry.count("a"), 1);
        assert_eq!(registry.count("b"), 0);
        assert!(!registry.0.contains_key("c"));
    }

    async fn racing_deletes_keep_shared_tags(repo: Arc<dyn ContentRepository>) {
        let service = Arc::new(ContentService::new(repo.clone(), ChangeFeed::new(), 20));

        for round in 0..20 {
            let tag = format!("shared{round}");
            service
                .create_video(video_input("Keep", &tag))
                .await
                .unwrap();
            let gone = service
                .create_video(video_input("Gone", &tag))
                .await
                .unwrap();

            let deletes: Vec<_> = (0..2)
                .map(|_| {
                    let service = service.clone();
                    let id = gone.id.clone();
                    tokio::spawn(async move { service.delete_video(&id).await })
                })
                .collect();
            for delete in deletes {
                // The loser may see the video already gone.
                let _ = delete.await.unwrap();
            }

            assert_eq!(repo.tag_registry().await.unwrap().count(&tag), 1);
        }
        assert_eq!(repo.tag_registry().await.unwrap(), recount(&repo).await);
    }

    async fn racing_updates_match_recount(repo: Arc<dyn ContentRepository>) {
        let service = Arc::new(ContentService::new(repo.clone(), ChangeFeed::new(), 20));
        let video = service
            .create_video(video_input("Contested", "start"))
            .await
            .unwrap();

        let updates: Vec<_> = ["left, both", "right, both", "left", "right"]
            .into_iter()
            .map(|tags| {
                let service = service.clone();
                let id = video.id.clone();
                tokio::spawn(async move {
                    service
                        .update_video(&id, video_input("Contested", tags))
                        .await
                })
            })
            .collect();
        for update in updates {
            update.await.unwrap().unwrap();
        }

        assert_eq!(repo.tag_registry().await.unwrap(), recount(&repo).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_decrement_once_in_memory() {
        racing_deletes_keep_shared_tags(Arc::new(InMemoryRepository::new())).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_decrement_once_in_sqlite() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("race.db"))
            .await
            .unwrap();
        racing_deletes_keep_shared_tags(Arc::new(db)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_keep_registry_exact() {
        racing_updates_match_recount(Arc::new(InMemoryRepository::new())).await;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("updates.db"))
            .await
            .unwrap();
        racing_updates_match_recount(Arc::new(db)).await;
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_mutation() {
        let (service, repo) = service();
        let mut input = video_input("X", "a");
        input.image = "poster.jpg".to_string();
        input.models.clear();

        match service.create_video(input).await {
            Err(AppError::InvalidFields(fields)) => {
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("image"));
                assert!(fields.contains_key("models"));
            }
            other => panic!("expected invalid fields, got {other:?}"),
        }
        assert!(repo.list::<Video>().await.unwrap().is_empty());
        assert!(repo.tag_registry().await.unwrap().0.is_empty());
    }

    #[tokio::test]
    async fn gallery_album_urls_are_checked() {
        let (service, _) = service();
        let mut input = gallery_input("Album", "");
        input.album.push("nope".to_string());

        match service.create_gallery(input).await {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("album.1")),
            other => panic!("expected invalid fields, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_keeps_id_and_date() {
        let (service, _) = service();
        let created = service
            .create_video(video_input("Original", ""))
            .await
            .unwrap();
        let updated = service
            .update_video(&created.id, video_input("Renamed", ""))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.delete_video("missing").await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service
                .update_gallery("missing", gallery_input("Album", ""))
                .await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn mutations_are_broadcast() {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        let events = ChangeFeed::new();
        let mut receiver = events.subscribe();
        let service = ContentService::new(repo, events, 20);

        let video = service
            .create_video(video_input("Broadcast", ""))
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.action, ChangeAction::Created);
        assert_eq!(event.id.as_deref(), Some(video.id.as_str()));
    }

    #[tokio::test]
    async fn admin_listing_includes_drafts() {
        let (service, _) = service();
        service
            .create_gallery(gallery_input("Draft album", ""))
            .await
            .unwrap();
        let page = service.list_galleries(1).await.unwrap();
        assert_eq!(page.total_items, 1);
    }
}
