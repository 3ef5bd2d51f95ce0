//! Accounts service
//!
//! Registration, credential verification, secret submission, and the
//! federated find-or-create. Business logic separated from HTTP
//! handlers.

use std::sync::Arc;

use crate::auth::password;
use crate::data::{Database, User, UserId};
use crate::error::AppError;

const MAX_USERNAME_LEN: usize = 64;
const MAX_PASSWORD_LEN: usize = 512;
const MAX_SECRET_LEN: usize = 4096;

/// Accounts service
pub struct AccountService {
    db: Arc<Database>,
    bcrypt_cost: u32,
}

impl AccountService {
    /// Create new accounts service
    pub fn new(db: Arc<Database>, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Register a local user.
    ///
    /// Hashes the password at the configured cost and inserts the
    /// record; the unique index on username turns a duplicate into
    /// `DuplicateIdentity`.
    ///
    /// # Errors
    /// `Validation` for malformed input, `DuplicateIdentity` for a
    /// taken username.
    pub async fn register(&self, username: &str, raw_password: &str) -> Result<UserId, AppError> {
        let username = validate_username(username)?;
        validate_password(raw_password)?;

        let password_hash = password::hash_password(raw_password, self.bcrypt_cost).await?;
        let user = self.db.insert_local_user(&username, &password_hash).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.id())
    }

    /// Verify a local login.
    ///
    /// Unknown username and wrong password are indistinguishable in the
    /// result; the unknown-username path still burns a bcrypt
    /// comparison so timing does not give it away either.
    ///
    /// # Errors
    /// `AuthenticationFailure` for bad credentials, whatever the reason.
    pub async fn verify_login(&self, username: &str, raw_password: &str) -> Result<UserId, AppError> {
        let username = username.trim();

        let Some(user) = self.db.find_user_by_username(username).await? else {
            password::burn_verification(raw_password).await?;
            tracing::debug!("Login attempt for unknown username");
            return Err(AppError::AuthenticationFailure);
        };

        // A federated-only record has no local credential to check.
        let Some(stored_hash) = user.password_hash.as_deref() else {
            password::burn_verification(raw_password).await?;
            tracing::debug!(user_id = %user.id, "Login attempt against passwordless record");
            return Err(AppError::AuthenticationFailure);
        };

        if !password::verify_password(raw_password, stored_hash).await? {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::AuthenticationFailure);
        }

        Ok(user.id())
    }

    /// Log in (or sign up) through a Google subject id.
    ///
    /// Atomic find-or-create; see `Database::find_or_create_user_by_google_id`.
    pub async fn login_with_google(&self, subject_id: &str) -> Result<User, AppError> {
        let user = self.db.find_or_create_user_by_google_id(subject_id).await?;
        tracing::info!(user_id = %user.id, "Google login resolved");
        Ok(user)
    }

    /// Overwrite the caller's secret. Last write wins.
    ///
    /// # Errors
    /// `Validation` for malformed input; `Unauthorized` if the user row
    /// has vanished under the session.
    pub async fn submit_secret(&self, user_id: &UserId, secret: &str) -> Result<(), AppError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(AppError::Validation("secret cannot be empty".to_string()));
        }
        if secret.len() > MAX_SECRET_LEN {
            return Err(AppError::Validation(format!(
                "secret cannot exceed {} bytes",
                MAX_SECRET_LEN
            )));
        }

        if !self.db.set_user_secret(&user_id.0, secret).await? {
            return Err(AppError::Unauthorized);
        }

        tracing::info!(user_id = %user_id, "Secret updated");
        Ok(())
    }

    /// All users with a non-empty secret, for the public listing.
    pub async fn list_secrets(&self) -> Result<Vec<User>, AppError> {
        self.db.list_users_with_secrets().await
    }
}

fn validate_username(username: &str) -> Result<String, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username cannot exceed {} bytes",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username.to_string())
}

fn validate_password(raw_password: &str) -> Result<(), AppError> {
    if raw_password.is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }
    if raw_password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password cannot exceed {} bytes",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed_and_bounded() {
        assert_eq!(validate_username("  alice  ").unwrap(), "alice");
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn password_is_bounded() {
        assert!(validate_password("hunter2").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }
}
