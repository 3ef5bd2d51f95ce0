//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-bound queries against a single `users` table
//! plus the server-side `sessions` table.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a locally-registered user.
    ///
    /// # Errors
    /// `DuplicateIdentity` if the username is already taken.
    pub async fn insert_local_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let now = Utc::now();
        let user = User {
            id: UserId::new().0,
            username: Some(username.to_string()),
            password_hash: Some(password_hash.to_string()),
            google_id: None,
            secret: None,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, google_id, secret, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.google_id)
        .bind(&user.secret)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(error) if is_unique_violation(&error) => Err(AppError::DuplicateIdentity),
            Err(error) => Err(error.into()),
        }
    }

    /// Look up a user by local login name.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Look up a user by id.
    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Look up a user by Google subject id.
    pub async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_id = ?")
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find the user for a Google subject id, creating one on first login.
    ///
    /// The insert is a single statement guarded by the unique index on
    /// `google_id`, so concurrent first-time callbacks for the same
    /// subject id create at most one record; losers of the race fall
    /// through to the select. Existing records are never modified.
    pub async fn find_or_create_user_by_google_id(
        &self,
        google_id: &str,
    ) -> Result<User, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, google_id, secret, created_at, updated_at)
            SELECT ?, NULL, NULL, ?, NULL, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM users WHERE google_id = ?)
            "#,
        )
        .bind(UserId::new().0)
        .bind(google_id)
        .bind(now)
        .bind(now)
        .bind(google_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            // Lost the insert race; the winner's row is selected below.
            Err(error) if is_unique_violation(&error) => {}
            Err(error) => return Err(error.into()),
        }

        self.find_user_by_google_id(google_id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "user missing immediately after find-or-create"
            ))
        })
    }

    /// Overwrite a user's secret. Last write wins.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching user row exists.
    pub async fn set_user_secret(&self, user_id: &str, secret: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET secret = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(secret)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// All users whose secret field is non-empty, oldest first.
    pub async fn list_users_with_secrets(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE secret IS NOT NULL AND secret != ''
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Total registered users, for the users gauge.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Store a session under a token digest.
    ///
    /// Raw tokens never touch the database; the caller (auth::session)
    /// digests them first.
    pub async fn insert_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve a token digest to its session record, if one exists.
    ///
    /// Expired records are treated as absent (and cleaned up lazily by
    /// the sweeper).
    pub async fn find_session(&self, token_hash: &str) -> Result<Option<SessionRecord>, AppError> {
        let session =
            sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;

        Ok(session.filter(|record| !record.is_expired()))
    }

    /// Delete the session for a token digest. Idempotent.
    pub async fn delete_session(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove all expired session rows.
    ///
    /// # Returns
    /// Number of rows deleted.
    pub async fn delete_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
