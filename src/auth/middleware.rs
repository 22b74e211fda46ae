//! Authentication middleware
//!
//! Protects routes that require a session or the admin role.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::session::{Session, verify_session_token};
use crate::AppState;
use crate::error::AppError;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

fn session_from_parts(parts: &mut Parts, state: &AppState) -> Result<Session, AppError> {
    if let Some(session) = parts.extensions.get::<Session>().cloned() {
        return Ok(session);
    }

    let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
    let session = verify_session_token(&token, &state.config.auth.session_secret)?;
    parts.extensions.insert(session.clone());
    Ok(session)
}

/// Middleware to require the admin role
///
/// Verifies the session from cookie or Authorization header and adds it
/// to request extensions.
///
/// # Usage
/// ```ignore
/// let admin_routes = Router::new()
///     .route("/admin/...", ...)
///     .layer(middleware::from_fn_with_state(state, require_admin));
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token_from_headers(request.headers()).ok_or(AppError::Unauthorized)?;
    let session = verify_session_token(&token, &state.config.auth.session_secret)?;

    if !session.is_admin() {
        tracing::warn!(user_id = %session.user_id, "Admin route refused");
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Extractor for current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        session_from_parts(parts, &state).map(CurrentUser)
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(MaybeUser(session_from_parts(parts, &state).ok()))
    }
}

/// Session holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let session = session_from_parts(parts, &state)?;
        if !session.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(session))
    }
}
