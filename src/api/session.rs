//! Session exchange
//!
//! The identity provider hands the browser a signed identity token; it is
//! traded here for the `session` cookie.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use super::dto::SessionResponse;
use crate::AppState;
use crate::auth::{MaybeUser, SESSION_COOKIE, Session, create_session_token, verify_identity_token};
use crate::data::User;
use crate::error::AppError;
use crate::service::UserService;

/// Routes:
/// - GET /session - current user, or null when signed out
/// - POST /session - exchange an identity token for a session
/// - DELETE /session - sign out
pub fn session_router() -> Router<AppState> {
    Router::new().route(
        "/session",
        get(current_session)
            .post(create_session)
            .delete(end_session),
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn build_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

/// GET /api/auth/session
///
/// A session whose account was removed reads as signed out.
async fn current_session(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
) -> Result<Json<Option<User>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(None));
    };

    match UserService::new(state.repo.clone(), state.events.clone())
        .get(&session.user_id)
        .await
    {
        Ok(user) => Ok(Json(Some(user))),
        Err(AppError::NotFound) => Ok(Json(None)),
        Err(error) => Err(error),
    }
}

/// POST /api/auth/session
///
/// `Authorization: Bearer <identity token>`
async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let identity_token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_identity_token(identity_token, &state.config.auth.identity_secret)
        .inspect_err(|error| tracing::warn!(%error, "Identity token rejected"))?;

    let user = UserService::new(state.repo.clone(), state.events.clone())
        .sign_in(&claims, &state.config.auth)
        .await?;

    let session = Session::for_user(&user, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let cookie = build_session_cookie(token.clone(), state.config.should_use_secure_cookies());

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            token,
            expires_at: session.expires_at,
            user,
        }),
    ))
}

/// DELETE /api/auth/session
async fn end_session(jar: CookieJar) -> impl IntoResponse {
    (jar.add(clear_session_cookie()), StatusCode::NO_CONTENT)
}
