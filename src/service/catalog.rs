//! Model and hero profile administration

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use super::keywords::model_keywords;
use super::listing::{ListQuery, Page, page_of, paginate};
use super::validation::{FieldCheck, is_url};
use crate::data::{
    ContentRepository, Document, EntityId, ImageType, Model, ModelImage, ModelProfile,
    PublishStatus, RepositoryExt,
};
use crate::error::AppError;
use crate::events::{ChangeAction, ChangeFeed};

/// Most carousel images a profile may carry
pub const MAX_CAROUSEL_IMAGES: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub bust: Option<String>,
    #[serde(default)]
    pub waist: Option<String>,
    #[serde(default)]
    pub hips: Option<String>,
    #[serde(default)]
    pub famous_for: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ModelInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut check = FieldCheck::new();
        check.length("name", &self.name, 1, 100);
        check.url("image", &self.image);
        check.finish()
    }

    fn into_model(self, id: String, created_at: chrono::DateTime<Utc>) -> Model {
        let name = self.name.trim().to_string();
        let category = clean(self.category);
        Model {
            keywords: model_keywords(&name, category.as_deref()),
            id,
            name,
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            status: self.status,
            category,
            instagram: clean(self.instagram),
            twitter: clean(self.twitter),
            height: clean(self.height),
            bust: clean(self.bust),
            waist: clean(self.waist),
            hips: clean(self.hips),
            famous_for: clean(self.famous_for),
            created_at,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelImageInput {
    pub image_type: ImageType,
    #[serde(default)]
    pub image_position: Option<u8>,
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ModelImageInput>,
}

impl ProfileInput {
    /// Exactly one background and one main image, up to ten carousel images
    /// each holding a distinct position in 1..=10.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut check = FieldCheck::new();
        check.length("name", &self.name, 1, 100);

        let count = |image_type: ImageType| {
            self.images
                .iter()
                .filter(|image| image.image_type == image_type)
                .count()
        };
        check.require(
            "images.background",
            count(ImageType::Background) == 1,
            "Exactly one background image is required",
        );
        check.require(
            "images.main",
            count(ImageType::Main) == 1,
            "Exactly one main image is required",
        );
        check.require(
            "images.carousel",
            count(ImageType::Carousel) <= MAX_CAROUSEL_IMAGES,
            "At most 10 carousel images are allowed",
        );

        let mut positions = BTreeSet::new();
        for (index, image) in self.images.iter().enumerate() {
            if !is_url(&image.image_url) {
                check.fail(&format!("images.{index}.imageUrl"), "Must be a valid URL");
            }
            match (image.image_type, image.image_position) {
                (ImageType::Carousel, Some(position))
                    if (1..=MAX_CAROUSEL_IMAGES as u8).contains(&position) =>
                {
                    if !positions.insert(position) {
                        check.fail(
                            &format!("images.{index}.imagePosition"),
                            "Carousel position already used",
                        );
                    }
                }
                (ImageType::Carousel, _) => check.fail(
                    &format!("images.{index}.imagePosition"),
                    "Carousel images need a position from 1 to 10",
                ),
                (_, Some(_)) => check.fail(
                    &format!("images.{index}.imagePosition"),
                    "Only carousel images take a position",
                ),
                (_, None) => {}
            }
        }

        check.finish()
    }

    fn into_profile(self, id: String, created_at: chrono::DateTime<Utc>) -> ModelProfile {
        let now = Utc::now();
        let images = self
            .images
            .into_iter()
            .map(|image| ModelImage {
                id: EntityId::new().0,
                model_profile_id: id.clone(),
                image_type: image.image_type,
                image_position: image.image_position,
                image_url: image.image_url.trim().to_string(),
                created_at: now,
            })
            .collect();

        ModelProfile {
            id,
            name: self.name.trim().to_string(),
            category: clean(self.category),
            description: self.description.trim().to_string(),
            images,
            created_at,
            updated_at: now,
        }
    }
}

/// Admin operations on catalog models and hero profiles
///
/// Deleting either never touches videos or galleries naming the model.
pub struct CatalogService {
    repo: Arc<dyn ContentRepository>,
    events: ChangeFeed,
    page_size: usize,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn ContentRepository>, events: ChangeFeed, page_size: usize) -> Self {
        Self {
            repo,
            events,
            page_size,
        }
    }

    // =========================================================================
    // Models
    // =========================================================================

    pub async fn list_models(&self, page: usize) -> Result<Page<Model>, AppError> {
        let models = self.repo.list::<Model>().await?;
        Ok(paginate(
            &models,
            &ListQuery::page(page, self.page_size),
            self.page_size,
        ))
    }

    pub async fn get_model(&self, id: &str) -> Result<Model, AppError> {
        self.repo.get::<Model>(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create_model(&self, input: ModelInput) -> Result<Model, AppError> {
        input.validate()?;
        let model = input.into_model(EntityId::new().0, Utc::now());
        self.repo.put(&model).await?;
        self.events
            .publish(Model::COLLECTION, ChangeAction::Created, Some(&model.id));
        tracing::info!(id = %model.id, name = %model.name, "Model created");
        Ok(model)
    }

    pub async fn update_model(&self, id: &str, input: ModelInput) -> Result<Model, AppError> {
        input.validate()?;
        let existing = self.get_model(id).await?;
        let model = input.into_model(existing.id, existing.created_at);
        self.repo.put(&model).await?;
        self.events
            .publish(Model::COLLECTION, ChangeAction::Updated, Some(&model.id));
        Ok(model)
    }

    pub async fn delete_model(&self, id: &str) -> Result<(), AppError> {
        self.get_model(id).await?;
        self.repo.remove::<Model>(id).await?;
        self.events
            .publish(Model::COLLECTION, ChangeAction::Deleted, Some(id));
        tracing::info!(id, "Model deleted");
        Ok(())
    }

    // =========================================================================
    // Hero profiles
    // =========================================================================

    /// Profiles, most recently updated first.
    pub async fn list_profiles(&self, page: usize) -> Result<Page<ModelProfile>, AppError> {
        let mut profiles = self.repo.list::<ModelProfile>().await?;
        profiles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(page_of(profiles, page, self.page_size))
    }

    pub async fn get_profile(&self, id: &str) -> Result<ModelProfile, AppError> {
        self.repo
            .get::<ModelProfile>(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create_profile(&self, input: ProfileInput) -> Result<ModelProfile, AppError> {
        input.validate()?;
        let profile = input.into_profile(EntityId::new().0, Utc::now());
        self.repo.put(&profile).await?;
        self.events.publish(
            ModelProfile::COLLECTION,
            ChangeAction::Created,
            Some(&profile.id),
        );
        tracing::info!(id = %profile.id, images = profile.images.len(), "Profile created");
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        id: &str,
        input: ProfileInput,
    ) -> Result<ModelProfile, AppError> {
        input.validate()?;
        let existing = self.get_profile(id).await?;
        let profile = input.into_profile(existing.id, existing.created_at);
        self.repo.put(&profile).await?;
        self.events.publish(
            ModelProfile::COLLECTION,
            ChangeAction::Updated,
            Some(&profile.id),
        );
        Ok(profile)
    }

    pub async fn delete_profile(&self, id: &str) -> Result<(), AppError> {
        self.get_profile(id).await?;
        self.repo.remove::<ModelProfile>(id).await?;
        self.events
            .publish(ModelProfile::COLLECTION, ChangeAction::Deleted, Some(id));
        Ok(())
    }
}
