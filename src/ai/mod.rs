//! AI-assisted marketing copy
//!
//! [`AiService`] builds prompts and interprets answers; the model itself is
//! reached through the [`TextGenerator`] seam. Failures surface as
//! [`AppError::Upstream`] with no retry and no partial result.

mod image;
mod openai;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use image::{FALLBACK_IMAGE_DATA_URI, image_data_uri};
pub use openai::OpenAiClient;

use crate::error::AppError;

const MAX_FUN_FACTS: usize = 4;
const MAX_RECOMMENDATIONS: usize = 3;

/// One request to the text model
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub text: String,
    /// Image inlined as a data URI
    pub image: Option<String>,
}

/// Text generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: Prompt) -> Result<String, AppError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub title: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunFacts {
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Description {
    pub description: String,
}

/// Catalog item as shown to the recommender
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub models: Vec<String>,
    pub tags: Vec<String>,
}

const FUN_FACTS_SYSTEM: &str = "You are a witty and sophisticated creative assistant for a luxury \
fashion brand. Your tone is intriguing and sophisticated, but strictly safe-for-work. Never \
produce anything explicit or vulgar.";

const DESCRIPTION_SYSTEM: &str = "You are a creative copywriter for a luxury content platform. \
Your tone is sophisticated, evocative and alluring.";

fn fun_facts_prompt(model_name: &str) -> Prompt {
    Prompt {
        system: FUN_FACTS_SYSTEM.to_string(),
        text: format!(
            "Generate a short list of 3-4 \"fun facts\" for the fashion model named {model_name}.\n\
             Draw on these themes: mysterious pasts or hidden talents, luxurious or eccentric \
             habits, a taste for the finer things in life, a surprisingly down-to-earth hobby.\n\
             The facts should be creative and plausible for a high-fashion model.\n\
             Reply with JSON only, shaped as {{\"facts\": [\"...\"]}}."
        ),
        image: None,
    }
}

fn description_prompt(request: &DescriptionRequest, image: String) -> Prompt {
    Prompt {
        system: DESCRIPTION_SYSTEM.to_string(),
        text: format!(
            "Write a compelling, SEO-friendly description of 2-3 sentences for a new piece of \
             content.\nTitle: {}\nModels: {}\nTags: {}\n\
             Use the attached cover image as the primary inspiration for mood and narrative. \
             Reply with the description text only.",
            request.title,
            request.models.join(", "),
            request.tags.join(", "),
        ),
        image: Some(image),
    }
}

const RECOMMEND_SYSTEM: &str = "You are a recommendation engine for a luxury content platform.";

fn candidate_lines(items: &[Candidate]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- Title: {} (ID: {})\n  Description: {}\n  Models: {}\n  Tags: {}\n",
                item.title,
                item.id,
                item.description,
                item.models.join(", "),
                item.tags.join(", "),
            )
        })
        .collect()
}

fn recommend_prompt(favorites: &[Candidate], pool: &[Candidate]) -> Prompt {
    Prompt {
        system: RECOMMEND_SYSTEM.to_string(),
        text: format!(
            "Analyze the user's favorites to understand their preferences for models, tags and \
             themes.\nUser's favorites:\n{}\n\
             Based on these preferences, select up to {MAX_RECOMMENDATIONS} items from the \
             available content below. Do not recommend items the user has already favorited.\n\
             Available content:\n{}\n\
             Reply with JSON only: an array of the recommended content IDs.",
            candidate_lines(favorites),
            candidate_lines(pool),
        ),
        image: None,
    }
}

fn strip_fence(answer: &str) -> &str {
    answer
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Pull recommended ids out of a model answer.
///
/// Accepts a JSON array of ids, optionally fenced, or an object with an
/// `ids` array. Anything else yields no ids.
pub fn parse_recommended_ids(answer: &str) -> Vec<String> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Answer {
        Ids(Vec<String>),
        Wrapped { ids: Vec<String> },
    }

    match serde_json::from_str::<Answer>(strip_fence(answer)) {
        Ok(Answer::Ids(ids) | Answer::Wrapped { ids }) => ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Pull the fact list out of a model answer.
///
/// Accepts the requested JSON shape, optionally fenced, and falls back to
/// one fact per bulleted or numbered line.
pub fn parse_fun_facts(answer: &str) -> Vec<String> {
    #[derive(Deserialize)]
    struct Facts {
        facts: Vec<String>,
    }

    let trimmed = strip_fence(answer);

    let facts = match serde_json::from_str::<Facts>(trimmed) {
        Ok(parsed) => parsed.facts,
        Err(_) => trimmed
            .lines()
            .map(|line| {
                line.trim()
                    .trim_start_matches(|c: char| {
                        c == '-' || c == '*' || c == '•' || c == '.' || c == ')' || c.is_ascii_digit()
                    })
                    .trim()
                    .trim_matches('"')
                    .to_string()
            })
            .collect(),
    };

    facts
        .into_iter()
        .map(|fact| fact.trim().to_string())
        .filter(|fact| !fact.is_empty())
        .take(MAX_FUN_FACTS)
        .collect()
}

/// Prompt building and answer handling around a [`TextGenerator`]
pub struct AiService {
    generator: Arc<dyn TextGenerator>,
    http_client: Arc<reqwest::Client>,
}

impl AiService {
    pub fn new(generator: Arc<dyn TextGenerator>, http_client: Arc<reqwest::Client>) -> Self {
        Self {
            generator,
            http_client,
        }
    }

    async fn run(&self, kind: &str, prompt: Prompt) -> Result<String, AppError> {
        let started = Instant::now();
        let result = self.generator.generate(prompt).await;
        let status = if result.is_ok() { "success" } else { "error" };
        crate::metrics::observe_ai_request(kind, status, started.elapsed());

        result.map_err(|error| {
            tracing::warn!(kind, %error, "Text generation failed");
            match error {
                AppError::Upstream(_) | AppError::Unavailable(_) => error,
                other => AppError::Upstream(other.to_string()),
            }
        })
    }

    pub async fn fun_facts(&self, model_name: &str) -> Result<FunFacts, AppError> {
        let model_name = model_name.trim();
        if model_name.is_empty() {
            return Err(AppError::field("modelName", "Model name is required"));
        }

        let answer = self.run("fun_facts", fun_facts_prompt(model_name)).await?;
        let facts = parse_fun_facts(&answer);
        if facts.is_empty() {
            return Err(AppError::Upstream(
                "model answer contained no facts".to_string(),
            ));
        }
        Ok(FunFacts { facts })
    }

    pub async fn describe(&self, request: &DescriptionRequest) -> Result<Description, AppError> {
        if request.title.trim().is_empty() {
            return Err(AppError::field("title", "Title is required"));
        }
        if !crate::service::is_url(&request.image_url) {
            return Err(AppError::field("imageUrl", "Must be a valid URL"));
        }

        let image = image_data_uri(&self.http_client, &request.image_url).await;
        let answer = self
            .run("description", description_prompt(request, image))
            .await?;

        let description = answer.trim().trim_matches('"').trim().to_string();
        if description.is_empty() {
            return Err(AppError::Upstream("model answer was empty".to_string()));
        }
        Ok(Description { description })
    }

    /// Pick up to three catalog ids the user has not favorited yet.
    ///
    /// Returns no ids without calling out when there are no favorites or
    /// nothing left to suggest. Ids the model invents or repeats are dropped.
    pub async fn recommend(
        &self,
        favorites: &[Candidate],
        catalog: &[Candidate],
    ) -> Result<Vec<String>, AppError> {
        let favorite_ids: HashSet<&str> = favorites.iter().map(|item| item.id.as_str()).collect();
        let pool: Vec<Candidate> = catalog
            .iter()
            .filter(|item| !favorite_ids.contains(item.id.as_str()))
            .cloned()
            .collect();
        if favorites.is_empty() || pool.is_empty() {
            return Ok(Vec::new());
        }

        let answer = self
            .run("recommend", recommend_prompt(favorites, &pool))
            .await?;

        let known: HashSet<&str> = pool.iter().map(|item| item.id.as_str()).collect();
        let mut seen = HashSet::new();
        let ids: Vec<String> = parse_recommended_ids(&answer)
            .into_iter()
            .filter(|id| known.contains(id.as_str()))
            .filter(|id| seen.insert(id.clone()))
            .take(MAX_RECOMMENDATIONS)
            .collect();
        tracing::debug!(count = ids.len(), "Recommendations chosen");
        Ok(ids)
    }
}
