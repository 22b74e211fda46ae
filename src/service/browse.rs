//! Public catalog reads
//!
//! Only Published records are visible; anything else reads as not found.

use std::sync::Arc;

use serde::Serialize;

use super::listing::{ListQuery, Listable, Page, SortBy, paginate, published, sort_items};
use super::related::related;
use crate::data::{
    ContentRepository, Document, Gallery, Model, Photo, RepositoryExt, TagRegistry, Video,
};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct VideoDetail {
    pub video: Video,
    pub related: Vec<Video>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryDetail {
    pub gallery: Gallery,
    pub photos: Vec<Photo>,
    pub related: Vec<Gallery>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDetail {
    pub model: Model,
    pub videos: Vec<Video>,
    pub galleries: Vec<Gallery>,
}

fn features_model(models: &[String], name: &str) -> bool {
    models
        .iter()
        .any(|model| model.trim().eq_ignore_ascii_case(name.trim()))
}

pub struct BrowseService {
    repo: Arc<dyn ContentRepository>,
    page_size: usize,
    related_limit: usize,
}

impl BrowseService {
    pub fn new(repo: Arc<dyn ContentRepository>, page_size: usize, related_limit: usize) -> Self {
        Self {
            repo,
            page_size,
            related_limit,
        }
    }

    async fn published_page<D>(&self, query: &ListQuery) -> Result<Page<D>, AppError>
    where
        D: Document + Listable,
    {
        let items = self.repo.list::<D>().await?;
        Ok(paginate(&published(&items), query, self.page_size))
    }

    async fn published_one<D>(&self, id: &str) -> Result<D, AppError>
    where
        D: Document + Listable,
    {
        self.repo
            .get::<D>(id)
            .await?
            .filter(|item| item.status().is_published())
            .ok_or(AppError::NotFound)
    }

    pub async fn videos(&self, query: &ListQuery) -> Result<Page<Video>, AppError> {
        self.published_page(query).await
    }

    pub async fn galleries(&self, query: &ListQuery) -> Result<Page<Gallery>, AppError> {
        self.published_page(query).await
    }

    pub async fn models(&self, query: &ListQuery) -> Result<Page<Model>, AppError> {
        self.published_page(query).await
    }

    pub async fn video(&self, id: &str) -> Result<VideoDetail, AppError> {
        let video: Video = self.published_one(id).await?;
        let pool = published(&self.repo.list::<Video>().await?);
        Ok(VideoDetail {
            related: related(&video, &pool, self.related_limit),
            video,
        })
    }

    pub async fn gallery(&self, id: &str) -> Result<GalleryDetail, AppError> {
        let gallery: Gallery = self.published_one(id).await?;
        let pool = published(&self.repo.list::<Gallery>().await?);
        Ok(GalleryDetail {
            photos: gallery.photos(),
            related: related(&gallery, &pool, self.related_limit),
            gallery,
        })
    }

    /// A model with the published content naming it, newest first.
    pub async fn model(&self, id: &str) -> Result<ModelDetail, AppError> {
        let model: Model = self.published_one(id).await?;

        let mut videos: Vec<Video> = published(&self.repo.list::<Video>().await?)
            .into_iter()
            .filter(|video| features_model(&video.models, &model.name))
            .collect();
        sort_items(&mut videos, SortBy::Newest);

        let mut galleries: Vec<Gallery> = published(&self.repo.list::<Gallery>().await?)
            .into_iter()
            .filter(|gallery| features_model(&gallery.models, &model.name))
            .collect();
        sort_items(&mut galleries, SortBy::Newest);

        Ok(ModelDetail {
            model,
            videos,
            galleries,
        })
    }

    pub async fn tags(&self) -> Result<TagRegistry, AppError> {
        self.repo.tag_registry().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InMemoryRepository, PublishStatus};
    use crate::service::listing::tests::video;

    async fn service_with(videos: Vec<Video>) -> BrowseService {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        for video in &videos {
            repo.put(video).await.unwrap();
        }
        BrowseService::new(repo, 12, 3)
    }

    #[tokio::test]
    async fn draft_detail_is_not_found() {
        let mut draft = video("draft", 1, &[]);
        draft.status = PublishStatus::Draft;
        let service = service_with(vec![draft]).await;

        assert!(matches!(
            service.video("draft").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn listing_hides_drafts() {
        let mut draft = video("draft", 1, &[]);
        draft.status = PublishStatus::Draft;
        let service = service_with(vec![draft, video("live", 2, &[])]).await;

        let page = service.videos(&ListQuery::default()).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, "live");
    }

    #[tokio::test]
    async fn detail_carries_related() {
        let service = service_with(vec![
            video("target", 5, &["editorial"]),
            video("match", 1, &["editorial"]),
            video("other", 9, &[]),
        ])
        .await;

        let detail = service.video("target").await.unwrap();
        let ids: Vec<&str> = detail.related.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["match", "other"]);
    }

    #[tokio::test]
    async fn related_skips_drafts() {
        let mut hidden = video("hidden", 8, &["editorial"]);
        hidden.status = PublishStatus::Draft;
        let service = service_with(vec![video("target", 5, &["editorial"]), hidden]).await;

        let detail = service.video("target").await.unwrap();
        assert!(detail.related.is_empty());
    }

    #[test]
    fn model_names_match_case_insensitively() {
        let models = vec!["Ava Stone".to_string()];
        assert!(features_model(&models, "ava stone"));
        assert!(!features_model(&models, "Ava"));
    }
}
