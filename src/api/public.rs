//! Public catalog endpoints
//!
//! No session required. Only Published records are served.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::get,
};

use super::dto::HomeParams;
use crate::AppState;
use crate::data::{Gallery, Model, TagRegistry, Video};
use crate::error::AppError;
use crate::service::{
    BrowseService, GalleryDetail, HomeFeed, HomeService, ListQuery, ModelDetail, Page,
    SearchQuery, SearchResults, SearchService, VideoDetail,
};

/// Create public router
///
/// Routes:
/// - GET /home
/// - GET /models, /models/:id
/// - GET /videos, /videos/:id
/// - GET /galleries, /galleries/:id
/// - GET /search
/// - GET /tags
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/models", get(list_models))
        .route("/models/:id", get(get_model))
        .route("/videos", get(list_videos))
        .route("/videos/:id", get(get_video))
        .route("/galleries", get(list_galleries))
        .route("/galleries/:id", get(get_gallery))
        .route("/search", get(search))
        .route("/tags", get(tags))
}

fn build_browse_service(state: &AppState) -> BrowseService {
    BrowseService::new(
        state.repo.clone(),
        state.config.catalog.page_size,
        state.config.catalog.related_limit,
    )
}

/// GET /api/home?seed=
///
/// Without a seed every request reshuffles.
async fn home(
    State(state): State<AppState>,
    Query(params): Query<HomeParams>,
) -> Result<Json<HomeFeed>, AppError> {
    let feed = HomeService::new(state.repo.clone()).feed(params.seed).await?;
    Ok(Json(feed))
}

/// GET /api/models?page&search&category&sortBy
async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Model>>, AppError> {
    Ok(Json(build_browse_service(&state).models(&query).await?))
}

/// GET /api/models/:id
async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModelDetail>, AppError> {
    Ok(Json(build_browse_service(&state).model(&id).await?))
}

/// GET /api/videos?page&search&category&sortBy
async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Video>>, AppError> {
    Ok(Json(build_browse_service(&state).videos(&query).await?))
}

/// GET /api/videos/:id
async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoDetail>, AppError> {
    Ok(Json(build_browse_service(&state).video(&id).await?))
}

/// GET /api/galleries?page&search&category&sortBy
async fn list_galleries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Gallery>>, AppError> {
    Ok(Json(build_browse_service(&state).galleries(&query).await?))
}

/// GET /api/galleries/:id
async fn get_gallery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GalleryDetail>, AppError> {
    Ok(Json(build_browse_service(&state).gallery(&id).await?))
}

/// GET /api/search?q&type&category
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let results = SearchService::new(state.repo.clone()).search(&query).await?;
    Ok(Json(results))
}

/// GET /api/tags
async fn tags(State(state): State<AppState>) -> Result<Json<TagRegistry>, AppError> {
    Ok(Json(build_browse_service(&state).tags().await?))
}
