//! Signed-in account endpoints
//!
//! All routes require a session.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use super::admin::ai_service;
use super::dto::FavoriteChange;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Favorite, User};
use crate::error::AppError;
use crate::service::{HistoryItem, LedgerService, Recommendation, ResolvedFavorites, UserService};

/// Create account router
///
/// Routes:
/// - GET /me
/// - GET/POST/DELETE /me/favorites
/// - GET /me/history
/// - POST /me/history/:video_id
/// - GET /me/recommendations
pub fn account_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route(
            "/me/favorites",
            get(list_favorites)
                .post(add_favorite)
                .delete(remove_favorite),
        )
        .route("/me/history", get(history))
        .route("/me/history/:video_id", post(record_view))
        .route("/me/recommendations", get(recommendations))
}

fn build_ledger_service(state: &AppState) -> LedgerService {
    LedgerService::new(state.repo.clone(), state.config.catalog.history_retention)
}

/// GET /api/me
async fn me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<User>, AppError> {
    let user = UserService::new(state.repo.clone(), state.events.clone())
        .get(&session.user_id)
        .await?;
    Ok(Json(user))
}

/// GET /api/me/favorites
///
/// Favorites whose target was deleted are dropped from the stored list.
async fn list_favorites(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<ResolvedFavorites>, AppError> {
    let favorites = build_ledger_service(&state)
        .favorites(&session.user_id)
        .await?;
    Ok(Json(favorites))
}

/// POST /api/me/favorites
async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(favorite): Json<Favorite>,
) -> Result<Json<FavoriteChange>, AppError> {
    let changed = build_ledger_service(&state)
        .set_favorite(&session.user_id, favorite, true)
        .await?;
    Ok(Json(FavoriteChange { changed }))
}

/// DELETE /api/me/favorites
async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(favorite): Json<Favorite>,
) -> Result<Json<FavoriteChange>, AppError> {
    let changed = build_ledger_service(&state)
        .set_favorite(&session.user_id, favorite, false)
        .await?;
    Ok(Json(FavoriteChange { changed }))
}

/// GET /api/me/history
async fn history(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<HistoryItem>>, AppError> {
    let items = build_ledger_service(&state)
        .history(&session.user_id)
        .await?;
    Ok(Json(items))
}

/// POST /api/me/history/:video_id
async fn record_view(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<StatusCode, AppError> {
    build_ledger_service(&state)
        .record_view(&session.user_id, &video_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me/recommendations
///
/// Up to three published items picked by the text model from the user's
/// favorites. 503 when AI copy is disabled.
async fn recommendations(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let ai = ai_service(&state)?;
    let picks = build_ledger_service(&state)
        .recommendations(&session.user_id, ai)
        .await?;
    Ok(Json(picks))
}
