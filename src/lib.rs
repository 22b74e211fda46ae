//! Atelier - a curated catalog of models, videos and photo galleries
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Public catalog and search endpoints                      │
//! │  - Account (favorites, history) endpoints                   │
//! │  - Admin CRUD, seed and AI copy endpoints                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Listing, shuffling, related and search selection         │
//! │  - Validation and tag bookkeeping                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - In-memory collections                                    │
//! │  - SQLite JSON documents (sqlx)                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Repository and document types
//! - `ai`: Text generation for admin copy
//! - `events`: Change feed
//! - `manifest`: Media folder manifests
//! - `auth`: Session and identity tokens
//! - `config`: Configuration management
//! - `error`: Error types

pub mod ai;
pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod manifest;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Content repository (memory or SQLite)
    pub repo: Arc<dyn data::ContentRepository>,

    /// Change feed for connected clients
    pub events: events::ChangeFeed,

    /// AI copy service, absent when disabled
    pub ai: Option<Arc<ai::AiService>>,

    /// HTTP client for outbound fetches
    pub http_client: Arc<reqwest::Client>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Open the configured repository
    /// 2. Build the HTTP client
    /// 3. Build the AI service when enabled
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let repo: Arc<dyn data::ContentRepository> = match config.database.backend {
            config::DatabaseBackend::Memory => {
                tracing::warn!("Using the in-memory repository; content is lost on restart");
                Arc::new(data::InMemoryRepository::new())
            }
            config::DatabaseBackend::Sqlite => {
                let db = data::Database::connect(&config.database.path).await?;
                tracing::info!(path = %config.database.path.display(), "Database connected");
                Arc::new(db)
            }
        };

        Self::with_repository(config, repo)
    }

    /// Build state around an existing repository
    pub fn with_repository(
        config: config::AppConfig,
        repo: Arc<dyn data::ContentRepository>,
    ) -> Result<Self, error::AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("atelier/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.ai.timeout_seconds))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;
        let http_client = Arc::new(http_client);

        let ai = if config.ai.enabled {
            let generator = ai::OpenAiClient::new(&config.ai)?;
            tracing::info!(model = %config.ai.model, "AI copy enabled");
            Some(Arc::new(ai::AiService::new(
                Arc::new(generator),
                http_client.clone(),
            )))
        } else {
            None
        };

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            repo,
            events: events::ChangeFeed::new(),
            ai,
            http_client,
        })
    }
}

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::{
        catch_panic::CatchPanicLayer, compression::CompressionLayer, limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        .nest("/admin", api::admin_router(state.clone()))
        .merge(api::metrics_router(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(api::metrics::track_http))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(CatchPanicLayer::custom(api::handle_panic))
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::with_repository(
            config::tests::valid_config(),
            Arc::new(data::InMemoryRepository::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = build_router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_routes_require_session() {
        let response = build_router(test_state())
            .oneshot(Request::get("/admin/videos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn ai_service_follows_config() {
        assert!(test_state().ai.is_none());

        let mut config = config::tests::valid_config();
        config.ai.enabled = true;
        let state =
            AppState::with_repository(config, Arc::new(data::InMemoryRepository::new())).unwrap();
        assert!(state.ai.is_some());
    }
}
