//! Homepage feed
//!
//! Sections are rebuilt per request; the optional seed pins the shuffle.

use std::sync::Arc;

use serde::Serialize;

use super::listing::{SortBy, published, sort_items};
use super::shuffle::shuffle;
use crate::data::{
    ContentRepository, Gallery, ImageType, Model, ModelImage, ModelProfile, RepositoryExt, Video,
};
use crate::error::AppError;

const TOP_VIDEOS: usize = 3;
const LATEST_VIDEOS_END: usize = 12;
const SHOWCASE_SIZE: usize = 12;
const HERO_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroModel {
    pub id: String,
    pub name: String,
    pub image: String,
}

/// Hero profile with images in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroProfile {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub description: String,
    pub background: Option<ModelImage>,
    pub main: Option<ModelImage>,
    pub carousel: Vec<ModelImage>,
}

impl From<&ModelProfile> for HeroProfile {
    fn from(profile: &ModelProfile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            category: profile.category.clone(),
            description: profile.description.clone(),
            background: profile.image_of(ImageType::Background).cloned(),
            main: profile.image_of(ImageType::Main).cloned(),
            carousel: profile.carousel().into_iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    pub featured: Vec<Video>,
    pub top_videos: Vec<Video>,
    pub latest_videos: Vec<Video>,
    pub galleries: Vec<Gallery>,
    pub models: Vec<Model>,
    pub hero: Vec<HeroModel>,
    pub hero_profile: Option<HeroProfile>,
}

/// Compose the feed from already loaded collections.
pub fn compose(
    videos: &[Video],
    galleries: &[Gallery],
    models: &[Model],
    profiles: &[ModelProfile],
    seed: Option<u64>,
) -> HomeFeed {
    let mut videos = published(videos);
    sort_items(&mut videos, SortBy::Newest);
    let (featured, regular): (Vec<Video>, Vec<Video>) =
        videos.into_iter().partition(|video| video.is_featured);

    let top_videos: Vec<Video> = regular.iter().take(TOP_VIDEOS).cloned().collect();
    let latest_videos: Vec<Video> = regular
        .iter()
        .skip(TOP_VIDEOS)
        .take(LATEST_VIDEOS_END - TOP_VIDEOS)
        .cloned()
        .collect();

    // Each section shuffles with its own offset of the seed
    let galleries: Vec<Gallery> = shuffle(published(galleries), seed)
        .into_iter()
        .take(SHOWCASE_SIZE)
        .collect();
    let models: Vec<Model> = shuffle(published(models), seed.map(|seed| seed.wrapping_add(1)))
        .into_iter()
        .take(SHOWCASE_SIZE)
        .collect();

    let hero = models
        .iter()
        .take(HERO_SIZE)
        .map(|model| HeroModel {
            id: model.id.clone(),
            name: model.name.clone(),
            image: model.image.clone(),
        })
        .collect();

    let hero_profile = shuffle(
        profiles.iter().collect::<Vec<_>>(),
        seed.map(|seed| seed.wrapping_add(2)),
    )
    .first()
    .map(|profile| HeroProfile::from(*profile));

    HomeFeed {
        featured,
        top_videos,
        latest_videos,
        galleries,
        models,
        hero,
        hero_profile,
    }
}

pub struct HomeService {
    repo: Arc<dyn ContentRepository>,
}

impl HomeService {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }

    pub async fn feed(&self, seed: Option<u64>) -> Result<HomeFeed, AppError> {
        let videos = self.repo.list::<Video>().await?;
        let galleries = self.repo.list::<Gallery>().await?;
        let models = self.repo.list::<Model>().await?;
        let profiles = self.repo.list::<ModelProfile>().await?;

        Ok(compose(&videos, &galleries, &models, &profiles, seed))
    }
}
