//! Request and response DTOs
//!
//! Shapes used only at the HTTP boundary. Domain documents are serialized
//! as they are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::User;

/// `?seed=` on the home feed
#[derive(Debug, Default, Deserialize)]
pub struct HomeParams {
    pub seed: Option<u64>,
}

/// `?page=` on admin listings (1-indexed)
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

/// Result of adding or removing a favorite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteChange {
    pub changed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunFactsRequest {
    pub model_name: String,
}

/// Issued session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}
