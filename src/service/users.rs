//! User accounts
//!
//! Accounts are created on first sign-in from the identity provider's
//! claims. The role is recomputed from the configured admin emails on every
//! sign-in.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::IdentityClaims;
use crate::config::AuthConfig;
use crate::data::{Collection, ContentRepository, RepositoryExt, Role, User};
use crate::error::AppError;
use crate::events::{ChangeAction, ChangeFeed};

pub struct UserService {
    repo: Arc<dyn ContentRepository>,
    events: ChangeFeed,
}

impl UserService {
    pub fn new(repo: Arc<dyn ContentRepository>, events: ChangeFeed) -> Self {
        Self { repo, events }
    }

    /// Create or refresh the account behind an identity.
    pub async fn sign_in(&self, claims: &IdentityClaims, auth: &AuthConfig) -> Result<User, AppError> {
        let role = if auth.is_admin_email(&claims.email) {
            Role::Admin
        } else {
            Role::User
        };

        let (user, action) = match self.repo.get::<User>(&claims.sub).await? {
            Some(mut user) => {
                user.email = claims.email.clone();
                user.name = claims.name.clone().unwrap_or(user.name);
                user.image = claims.picture.clone().unwrap_or(user.image);
                user.role = role;
                (user, ChangeAction::Updated)
            }
            None => (
                User {
                    id: claims.sub.clone(),
                    name: claims
                        .name
                        .clone()
                        .unwrap_or_else(|| claims.email.clone()),
                    email: claims.email.clone(),
                    image: claims.picture.clone().unwrap_or_default(),
                    role,
                    favorites: Vec::new(),
                    watch_history: Vec::new(),
                    created_at: Utc::now(),
                },
                ChangeAction::Created,
            ),
        };

        self.repo.put(&user).await?;
        self.events
            .publish(Collection::Users, action, Some(&user.id));
        tracing::info!(user_id = %user.id, role = ?user.role, "User signed in");
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        self.repo.get::<User>(id).await?.ok_or(AppError::NotFound)
    }

    /// All accounts, newest first.
    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.repo.list::<User>().await?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// Remove an account on behalf of an admin.
    ///
    /// Admins cannot remove themselves. Signing in again through the
    /// identity provider creates a fresh account.
    pub async fn delete(&self, id: &str, acting_user_id: &str) -> Result<(), AppError> {
        if id == acting_user_id {
            return Err(AppError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }
        self.get(id).await?;

        self.repo.remove::<User>(id).await?;
        self.events
            .publish(Collection::Users, ChangeAction::Deleted, Some(id));
        tracing::info!(user_id = id, deleted_by = acting_user_id, "User deleted");
        Ok(())
    }
}
