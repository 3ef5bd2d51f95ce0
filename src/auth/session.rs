//! Session management
//!
//! Opaque random tokens handed to the client in an HTTP-only cookie.
//! The server keeps only an HMAC-SHA256 digest keyed by the configured
//! session secret, so neither a leaked table nor an unkeyed rainbow
//! scan yields usable cookies. Logout deletes the server-side row, so
//! a replayed cookie resolves to anonymous.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::data::{Database, User};
use crate::error::AppError;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Generate a fresh opaque session token (32 random bytes, base64url).
fn generate_session_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a raw client token for storage and lookup.
fn hash_session_token(token: &str, secret: &str) -> Result<String, AppError> {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC key setup failed: {e}")))?;
    mac.update(token.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Serialize a user into a new session.
///
/// # Returns
/// The raw token to hand to the client.
pub async fn issue_session(
    db: &Database,
    secret: &str,
    user_id: &str,
    max_age_seconds: i64,
) -> Result<String, AppError> {
    let token = generate_session_token();
    let token_hash = hash_session_token(&token, secret)?;
    let expires_at = Utc::now() + Duration::seconds(max_age_seconds);
    db.insert_session(&token_hash, user_id, expires_at).await?;
    Ok(token)
}

/// Deserialize a presented token back into a user.
///
/// Unknown, expired, or revoked tokens resolve to `None` (anonymous);
/// only a store failure is an error.
pub async fn resolve_session(
    db: &Database,
    secret: &str,
    token: &str,
) -> Result<Option<User>, AppError> {
    let token_hash = hash_session_token(token, secret)?;
    let Some(record) = db.find_session(&token_hash).await? else {
        return Ok(None);
    };

    db.find_user_by_id(&record.user_id).await
}

/// Invalidate the session for a presented token. Idempotent.
pub async fn revoke_session(db: &Database, secret: &str, token: &str) -> Result<(), AppError> {
    let token_hash = hash_session_token(token, secret)?;
    db.delete_session(&token_hash).await
}

/// Build the session cookie carrying a raw token.
pub fn build_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Build a removal cookie that clears the session from the client.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "".to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        // 32 bytes in unpadded base64url
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn token_digest_is_deterministic_per_secret() {
        let a = hash_session_token("some-token", SECRET).unwrap();
        let b = hash_session_token("some-token", SECRET).unwrap();
        let c = hash_session_token("other-token", SECRET).unwrap();
        let d = hash_session_token("some-token", "another-secret-key-32-bytes-long").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        // HMAC-SHA256 is 32 bytes, 43 characters in unpadded base64url.
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = build_session_cookie("token".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
