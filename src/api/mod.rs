//! API layer
//!
//! HTTP handlers for:
//! - Public catalog browsing and search
//! - Signed-in account (favorites, watch history)
//! - Session exchange
//! - Admin API
//! - Change feed (server-sent events)
//! - Metrics (Prometheus)

mod account;
mod admin;
mod dto;
mod events;
pub mod metrics;
mod public;
mod session;

use std::any::Any;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;

pub use dto::*;

pub use admin::admin_router;
pub use metrics::metrics_router;

/// Routes mounted under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(public::public_router())
        .merge(events::events_router())
        .merge(account::account_router())
        .nest("/auth", session::session_router())
}

/// Turn a handler panic into a JSON 500.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    crate::metrics::ERRORS_TOTAL
        .with_label_values(&["panic"])
        .inc();

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}
