//! Password hashing
//!
//! bcrypt hash-and-compare with a configurable work factor. Hashing and
//! verification are CPU-bound, so both run on the blocking pool and
//! never stall the request-accept loop.

use crate::error::AppError;

/// A syntactically valid bcrypt hash that matches no real credential.
///
/// Verified when the presented username has no record, so the response
/// time of an unknown-user login matches a wrong-password login.
const DUMMY_HASH: &str = "$2b$10$EixZaYVK1fsbw1ZfbX3OXePaWxn96p36WQoeG6Lruj3vjPGga31lW";

/// Hash a raw password with the given bcrypt cost.
///
/// # Errors
/// Returns error if the cost is out of bcrypt's range or hashing fails.
pub async fn hash_password(raw_password: &str, cost: u32) -> Result<String, AppError> {
    let raw = raw_password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(raw, cost))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Verify a raw password against a stored bcrypt hash.
///
/// The comparison is bcrypt's own constant-time check; a malformed
/// stored hash is an internal error, not an authentication outcome.
pub async fn verify_password(raw_password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let raw = raw_password.to_string();
    let stored = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(raw, &stored))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password verification failed: {e}")))
}

/// Burn a bcrypt comparison against a fixed dummy hash.
///
/// Always returns `Ok(())`; the work is the point.
pub async fn burn_verification(raw_password: &str) -> Result<(), AppError> {
    let _ = verify_password(raw_password, DUMMY_HASH).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 keeps the test suite fast; the range is validated in config.
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify_round_trips() {
        let hash = hash_password("hunter2", TEST_COST).await.unwrap();
        assert!(verify_password("hunter2", &hash).await.unwrap());
        assert!(!verify_password("hunter3", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let a = hash_password("hunter2", TEST_COST).await.unwrap();
        let b = hash_password("hunter2", TEST_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn dummy_verification_never_matches() {
        assert!(!verify_password("anything", DUMMY_HASH).await.unwrap());
        burn_verification("anything").await.unwrap();
    }
}
