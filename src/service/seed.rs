//! Sample catalog for fresh installs
//!
//! Seeding adds a generated set of models, videos and galleries in one batch;
//! the repository counts their tags as it stores them. Clearing removes all
//! catalog content but keeps user accounts.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use super::keywords::{derive_keywords, model_keywords};
use crate::data::{
    Collection, ContentRepository, EntityId, Gallery, Model, PublishStatus, RepositoryExt, Video,
    WriteBatch,
};
use crate::error::AppError;
use crate::events::{ChangeAction, ChangeFeed};

const MODEL_COUNT: usize = 10;
const VIDEO_COUNT: usize = 12;
const GALLERY_COUNT: usize = 18;
const ALBUM_SIZE: usize = 10;
const FEATURED_VIDEOS: usize = 3;

const SAMPLE_TAGS: [&str; 10] = [
    "fashion",
    "portrait",
    "editorial",
    "studio",
    "outdoor",
    "black & white",
    "cinematic",
    "lifestyle",
    "art",
    "urban",
];

const SAMPLE_VIDEO_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub models: usize,
    pub videos: usize,
    pub galleries: usize,
}

/// Generated sample content
pub struct SampleCatalog {
    pub models: Vec<Model>,
    pub videos: Vec<Video>,
    pub galleries: Vec<Gallery>,
}

pub fn sample_catalog() -> SampleCatalog {
    let now = Utc::now();

    let models: Vec<Model> = (1..=MODEL_COUNT)
        .map(|n| {
            let name = format!("Model {n}");
            Model {
                id: EntityId::new().0,
                keywords: model_keywords(&name, Some("fashion")),
                description: format!(
                    "This is a short bio for {name}. Known for a striking editorial presence."
                ),
                image: format!("https://placehold.co/400x600.png?text=Model+{n}"),
                status: PublishStatus::Published,
                category: Some("fashion".to_string()),
                instagram: Some(format!("model{n}")),
                twitter: Some(format!("model{n}")),
                height: Some("5'10\"".to_string()),
                bust: Some("34B".to_string()),
                waist: Some("24\"".to_string()),
                hips: Some("35\"".to_string()),
                famous_for: Some(
                    "Featured in several international magazines and runway shows.".to_string(),
                ),
                name,
                created_at: now,
                updated_at: now,
            }
        })
        .collect();

    let model_name = |i: usize| models[i % models.len()].name.clone();
    let tag = |i: usize| SAMPLE_TAGS[i % SAMPLE_TAGS.len()].to_string();

    let videos: Vec<Video> = (0..VIDEO_COUNT)
        .map(|i| {
            let title = format!("Cinematic Scene {}", i + 1);
            let models = vec![model_name(i), model_name(i + 1)];
            let tags = vec![tag(i), tag(i + 2)];
            Video {
                id: EntityId::new().0,
                keywords: derive_keywords(&title, &models, &tags),
                description: "A beautifully shot cinematic scene featuring our top models."
                    .to_string(),
                image: format!("https://placehold.co/1280x720.png?text=Scene+{}", i + 1),
                video_url: SAMPLE_VIDEO_URL.to_string(),
                title,
                models,
                tags,
                status: PublishStatus::Published,
                is_featured: i < FEATURED_VIDEOS,
                date: now - Duration::days(i as i64),
                duration: Some(20.0 + i as f64 * 5.0),
                resolution: Some("1920x1080".to_string()),
                file_size: None,
                category: None,
            }
        })
        .collect();

    let galleries: Vec<Gallery> = (0..GALLERY_COUNT)
        .map(|i| {
            let title = format!("Photo Gallery {}", i + 1);
            let models = vec![model_name(i)];
            let tags = vec![tag(i), tag(i + 3)];
            Gallery {
                id: EntityId::new().0,
                keywords: derive_keywords(&title, &models, &tags),
                description: "An exclusive photo gallery from a recent shoot.".to_string(),
                image: format!("https://placehold.co/400x600.png?text=Gallery+{}", i + 1),
                album: (1..=ALBUM_SIZE)
                    .map(|j| format!("https://placehold.co/800x1200.png?text=Photo+{j}"))
                    .collect(),
                title,
                models,
                tags,
                status: PublishStatus::Published,
                date: now - Duration::days(2 * i as i64),
                resolution: Some("800x1200".to_string()),
                category: None,
            }
        })
        .collect();

    SampleCatalog {
        models,
        videos,
        galleries,
    }
}

pub struct SeedService {
    repo: Arc<dyn ContentRepository>,
    events: ChangeFeed,
}

impl SeedService {
    pub fn new(repo: Arc<dyn ContentRepository>, events: ChangeFeed) -> Self {
        Self { repo, events }
    }

    /// Insert the sample catalog in one batch.
    pub async fn seed(&self) -> Result<SeedReport, AppError> {
        let sample = sample_catalog();
        let mut batch = WriteBatch::new();
        for model in &sample.models {
            batch = batch.put(model)?;
        }
        for video in &sample.videos {
            batch = batch.put(video)?;
        }
        for gallery in &sample.galleries {
            batch = batch.put(gallery)?;
        }
        self.repo
            .commit_timed(batch, Collection::Tags)
            .await?;

        for collection in [
            Collection::Models,
            Collection::Videos,
            Collection::Galleries,
            Collection::Tags,
        ] {
            self.events.publish(collection, ChangeAction::Reset, None);
        }

        let report = SeedReport {
            models: sample.models.len(),
            videos: sample.videos.len(),
            galleries: sample.galleries.len(),
        };
        tracing::info!(?report, "Catalog seeded");
        Ok(report)
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.repo.clear().await?;
        for collection in [
            Collection::Models,
            Collection::Videos,
            Collection::Galleries,
            Collection::Profiles,
            Collection::Tags,
        ] {
            self.events.publish(collection, ChangeAction::Reset, None);
        }
        Ok(())
    }
}
