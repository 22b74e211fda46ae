//! Session authentication
//!
//! Handles:
//! - Identity token verification at sign-in
//! - Signed session cookies
//! - Authentication extractors and the admin guard

mod middleware;
pub mod session;

pub use middleware::{AdminUser, CurrentUser, MaybeUser, SESSION_COOKIE, require_admin};
pub use session::{
    IdentityClaims, Session, create_identity_token, create_session_token, verify_identity_token,
    verify_session_token,
};
