//! Session and identity tokens
//!
//! Both use HMAC-signed tokens, no server-side session storage needed.
//! Token format: base64(payload).base64(hmac_sha256(payload))

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;

use crate::data::{Role, User};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// User session data
///
/// Stored in the signed `session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for a signed-in user.
    pub fn for_user(user: &User, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Claims asserted by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable subject id, used as the user id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

fn keyed_mac(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Encryption(e.to_string()))
}

fn sign<T: Serialize>(value: &T, secret: &str) -> Result<String, AppError> {
    // 1. Serialize and base64 encode the payload
    let payload = serde_json::to_string(value)?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 2. Create HMAC-SHA256 signature
    let mut mac = keyed_mac(secret)?;
    mac.update(payload_b64.as_bytes());
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, AppError> {
    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    // 2. Verify HMAC signature
    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let mut mac = keyed_mac(secret)?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::InvalidSignature)?;

    // 3. Decode and deserialize payload
    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;
    serde_json::from_slice(&payload).map_err(|_| AppError::Unauthorized)
}

/// Create a signed session token
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    sign(session, secret)
}

/// Verify and decode a session token
///
/// # Errors
/// Returns error if signature is invalid, token is malformed or expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let session: Session = verify(token, secret)?;
    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }
    Ok(session)
}

/// Sign identity claims with the secret shared with the identity provider
pub fn create_identity_token(claims: &IdentityClaims, secret: &str) -> Result<String, AppError> {
    sign(claims, secret)
}

/// Verify an identity token presented at sign-in
pub fn verify_identity_token(token: &str, secret: &str) -> Result<IdentityClaims, AppError> {
    let claims: IdentityClaims = verify(token, secret)?;
    if claims.exp < Utc::now().timestamp() {
        return Err(AppError::Unauthorized);
    }
    if claims.sub.trim().is_empty() || !claims.email.contains('@') {
        return Err(AppError::Unauthorized);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret-with-at-least-32-bytes";

    fn session(expires_in: i64) -> Session {
        let now = Utc::now();
        Session {
            user_id: "u1".to_string(),
            email: "visitor@example.com".to_string(),
            role: Role::User,
            created_at: now,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn session_token_round_trip() {
        let token = create_session_token(&session(60), SECRET).unwrap();
        let decoded = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded.user_id, "u1");
        assert!(!decoded.is_admin());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = create_session_token(&session(60), SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let mut forged = session(60);
        forged.role = Role::Admin;
        let forged_payload = general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&forged).unwrap().as_bytes());

        let result = verify_session_token(&format!("{forged_payload}.{signature}"), SECRET);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_session_token(&session(60), SECRET).unwrap();
        assert!(verify_session_token(&token, "another-secret-of-sufficient-length!!").is_err());
    }

    #[test]
    fn expired_session_is_rejected() {
        let token = create_session_token(&session(-1), SECRET).unwrap();
        assert!(matches!(
            verify_session_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "abc", "a.b.c", "!!!.???"] {
            assert!(verify_session_token(token, SECRET).is_err(), "{token}");
        }
    }

    #[test]
    fn identity_token_checks_expiry() {
        let mut claims = IdentityClaims {
            sub: "idp-123".to_string(),
            email: "visitor@example.com".to_string(),
            name: None,
            picture: None,
            exp: Utc::now().timestamp() + 60,
        };
        let token = create_identity_token(&claims, SECRET).unwrap();
        assert_eq!(verify_identity_token(&token, SECRET).unwrap().sub, "idp-123");

        claims.exp = Utc::now().timestamp() - 60;
        let token = create_identity_token(&claims, SECRET).unwrap();
        assert!(verify_identity_token(&token, SECRET).is_err());
    }
}
