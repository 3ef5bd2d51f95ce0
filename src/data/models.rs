//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// User ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
///
/// This is the opaque reference handed to the session layer; it is
/// sufficient to look up the full user record and never changes once
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered person, whichever way they signed up.
///
/// Valid field combinations:
/// - local-only: `username` + `password_hash` set, `google_id` None
/// - federated-only: `google_id` set, `username`/`password_hash` None
/// - linked-both: all three set
///
/// Every row carries at least one login method; the write paths never
/// insert a user without one. `secret` holds at most one free-text
/// secret, overwritten on each submission.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Local login name, unique when present
    pub username: Option<String>,
    /// bcrypt hash of the local password
    pub password_hash: Option<String>,
    /// Google subject id (`sub` claim), unique when present
    pub google_id: Option<String>,
    /// The user's single stored secret, if any
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn id(&self) -> UserId {
        UserId::from_string(self.id.clone())
    }
}

// =============================================================================
// Session
// =============================================================================

/// Server side of a session cookie.
///
/// The client holds the raw opaque token; only a keyed digest is
/// stored here, so a leaked table never yields usable cookies.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    /// base64url HMAC-SHA256 digest of the client token
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
