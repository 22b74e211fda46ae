//! Admin API endpoints
//!
//! Catalog administration. Every route requires a session with the admin
//! role; anonymous requests get 401, other roles 403.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
};

use super::dto::{FunFactsRequest, PageParams};
use crate::AppState;
use crate::ai::{AiService, Description, DescriptionRequest, FunFacts};
use crate::auth::{AdminUser, require_admin};
use crate::data::{Gallery, Model, ModelProfile, TagRegistry, User, Video};
use crate::error::AppError;
use crate::service::{
    BrowseService, CatalogService, ContentService, GalleryInput, ModelInput, Page, ProfileInput,
    SeedReport, SeedService, UserService, VideoInput,
};

/// Create admin router
///
/// Routes:
/// - GET/POST /models, GET/PUT/DELETE /models/:id
/// - GET/POST /videos, GET/PUT/DELETE /videos/:id
/// - GET/POST /galleries, GET/PUT/DELETE /galleries/:id
/// - GET/POST /profiles, GET/PUT/DELETE /profiles/:id
/// - GET /tags
/// - GET /users, DELETE /users/:id
/// - POST /seed
/// - POST /clear
/// - POST /ai/fun-facts
/// - POST /ai/description
pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Models
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/:id",
            get(get_model).put(update_model).delete(delete_model),
        )
        // Videos
        .route("/videos", get(list_videos).post(create_video))
        .route(
            "/videos/:id",
            get(get_video).put(update_video).delete(delete_video),
        )
        // Galleries
        .route("/galleries", get(list_galleries).post(create_gallery))
        .route(
            "/galleries/:id",
            get(get_gallery).put(update_gallery).delete(delete_gallery),
        )
        // Hero profiles
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        // Registry and accounts
        .route("/tags", get(tags))
        .route("/users", get(users))
        .route("/users/:id", delete(delete_user))
        // Sample data
        .route("/seed", post(seed))
        .route("/clear", post(clear))
        // AI copy
        .route("/ai/fun-facts", post(fun_facts))
        .route("/ai/description", post(describe))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

fn build_catalog_service(state: &AppState) -> CatalogService {
    CatalogService::new(
        state.repo.clone(),
        state.events.clone(),
        state.config.catalog.admin_page_size,
    )
}

fn build_content_service(state: &AppState) -> ContentService {
    ContentService::new(
        state.repo.clone(),
        state.events.clone(),
        state.config.catalog.admin_page_size,
    )
}

pub(super) fn ai_service(state: &AppState) -> Result<&AiService, AppError> {
    state
        .ai
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("AI copy is disabled".to_string()))
}

// =============================================================================
// Models
// =============================================================================

/// GET /admin/models?page=
async fn list_models(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Model>>, AppError> {
    let page = build_catalog_service(&state)
        .list_models(params.page())
        .await?;
    Ok(Json(page))
}

/// POST /admin/models
async fn create_model(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<ModelInput>,
) -> Result<(StatusCode, Json<Model>), AppError> {
    let model = build_catalog_service(&state).create_model(input).await?;
    tracing::info!(admin = %admin.email, id = %model.id, "Admin created model");
    Ok((StatusCode::CREATED, Json(model)))
}

/// GET /admin/models/:id
async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Model>, AppError> {
    Ok(Json(build_catalog_service(&state).get_model(&id).await?))
}

/// PUT /admin/models/:id
async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ModelInput>,
) -> Result<Json<Model>, AppError> {
    Ok(Json(
        build_catalog_service(&state).update_model(&id, input).await?,
    ))
}

/// DELETE /admin/models/:id
///
/// Videos and galleries naming the model keep the name.
async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    build_catalog_service(&state).delete_model(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Videos
// =============================================================================

/// GET /admin/videos?page=
async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Video>>, AppError> {
    let page = build_content_service(&state)
        .list_videos(params.page())
        .await?;
    Ok(Json(page))
}

/// POST /admin/videos
async fn create_video(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<VideoInput>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    let video = build_content_service(&state).create_video(input).await?;
    tracing::info!(admin = %admin.email, id = %video.id, "Admin created video");
    Ok((StatusCode::CREATED, Json(video)))
}

/// GET /admin/videos/:id
async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Video>, AppError> {
    Ok(Json(build_content_service(&state).get_video(&id).await?))
}

/// PUT /admin/videos/:id
async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<VideoInput>,
) -> Result<Json<Video>, AppError> {
    Ok(Json(
        build_content_service(&state).update_video(&id, input).await?,
    ))
}

/// DELETE /admin/videos/:id
async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    build_content_service(&state).delete_video(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Galleries
// =============================================================================

/// GET /admin/galleries?page=
async fn list_galleries(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Gallery>>, AppError> {
    let page = build_content_service(&state)
        .list_galleries(params.page())
        .await?;
    Ok(Json(page))
}

/// POST /admin/galleries
async fn create_gallery(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<GalleryInput>,
) -> Result<(StatusCode, Json<Gallery>), AppError> {
    let gallery = build_content_service(&state).create_gallery(input).await?;
    tracing::info!(admin = %admin.email, id = %gallery.id, "Admin created gallery");
    Ok((StatusCode::CREATED, Json(gallery)))
}

/// GET /admin/galleries/:id
async fn get_gallery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Gallery>, AppError> {
    Ok(Json(build_content_service(&state).get_gallery(&id).await?))
}

/// PUT /admin/galleries/:id
async fn update_gallery(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<GalleryInput>,
) -> Result<Json<Gallery>, AppError> {
    Ok(Json(
        build_content_service(&state)
            .update_gallery(&id, input)
            .await?,
    ))
}

/// DELETE /admin/galleries/:id
async fn delete_gallery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    build_content_service(&state).delete_gallery(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Hero profiles
// =============================================================================

/// GET /admin/profiles?page=
async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ModelProfile>>, AppError> {
    let page = build_catalog_service(&state)
        .list_profiles(params.page())
        .await?;
    Ok(Json(page))
}

/// POST /admin/profiles
async fn create_profile(
    State(state): State<AppState>,
    Json(input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<ModelProfile>), AppError> {
    let profile = build_catalog_service(&state).create_profile(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /admin/profiles/:id
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModelProfile>, AppError> {
    Ok(Json(build_catalog_service(&state).get_profile(&id).await?))
}

/// PUT /admin/profiles/:id
async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<ModelProfile>, AppError> {
    Ok(Json(
        build_catalog_service(&state)
            .update_profile(&id, input)
            .await?,
    ))
}

/// DELETE /admin/profiles/:id
async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    build_catalog_service(&state).delete_profile(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Registry and accounts
// =============================================================================

/// GET /admin/tags
async fn tags(State(state): State<AppState>) -> Result<Json<TagRegistry>, AppError> {
    let browse = BrowseService::new(
        state.repo.clone(),
        state.config.catalog.page_size,
        state.config.catalog.related_limit,
    );
    Ok(Json(browse.tags().await?))
}

/// GET /admin/users
async fn users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = UserService::new(state.repo.clone(), state.events.clone())
        .list()
        .await?;
    Ok(Json(users))
}

/// DELETE /admin/users/:id
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    UserService::new(state.repo.clone(), state.events.clone())
        .delete(&id, &admin.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sample data
// =============================================================================

/// POST /admin/seed
async fn seed(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<SeedReport>, AppError> {
    let report = SeedService::new(state.repo.clone(), state.events.clone())
        .seed()
        .await?;
    tracing::info!(admin = %admin.email, ?report, "Sample catalog seeded");
    Ok(Json(report))
}

/// POST /admin/clear
///
/// Removes all catalog content. Accounts are kept.
async fn clear(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<StatusCode, AppError> {
    SeedService::new(state.repo.clone(), state.events.clone())
        .clear()
        .await?;
    tracing::warn!(admin = %admin.email, "Catalog cleared");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// AI copy
// =============================================================================

/// POST /admin/ai/fun-facts
async fn fun_facts(
    State(state): State<AppState>,
    Json(request): Json<FunFactsRequest>,
) -> Result<Json<FunFacts>, AppError> {
    let facts = ai_service(&state)?.fun_facts(&request.model_name).await?;
    Ok(Json(facts))
}

/// POST /admin/ai/description
async fn describe(
    State(state): State<AppState>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<Description>, AppError> {
    let description = ai_service(&state)?.describe(&request).await?;
    Ok(Json(description))
}
