//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring and observability.
//! Scrapes need an admin session, the same as the admin API.

use std::time::Instant;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::AppState;
use crate::auth::require_admin;
use crate::data::{Collection, Gallery, Model, ModelProfile, RepositoryExt, User, Video};
use crate::metrics::{
    CATALOG_SIZE, HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL, REGISTRY,
};

/// Count requests by method and status.
pub async fn track_http(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, response.status().as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method])
        .observe(started.elapsed().as_secs_f64());
    response
}

async fn refresh_catalog_size(state: &AppState) -> Result<(), crate::error::AppError> {
    let repo = &state.repo;
    let sizes = [
        (Collection::Models, repo.list::<Model>().await?.len()),
        (Collection::Videos, repo.list::<Video>().await?.len()),
        (Collection::Galleries, repo.list::<Gallery>().await?.len()),
        (Collection::Profiles, repo.list::<ModelProfile>().await?.len()),
        (Collection::Users, repo.list::<User>().await?.len()),
        (Collection::Tags, repo.tag_registry().await?.0.len()),
    ];

    for (collection, size) in sizes {
        CATALOG_SIZE
            .with_label_values(&[collection.as_str()])
            .set(size as i64);
    }
    Ok(())
}

/// Metrics endpoint handler
///
/// Returns all metrics in Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    if let Err(e) = refresh_catalog_size(&state).await {
        tracing::warn!(error = %e, "Failed to refresh catalog size");
    }

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, encoder.format_type())],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

/// Create metrics router
///
/// Exposes the `/metrics` endpoint behind `require_admin`.
pub fn metrics_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
