//! Error types for Hushboard
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! Browser-facing flows (register/login/submit) catch the interesting
//! variants themselves and answer with a redirect instead, so nothing
//! structured ever reaches the client on those paths.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registration collision on a unique identity field (409)
    #[error("Identity already registered")]
    DuplicateIdentity,

    /// Bad credentials. Deliberately does not say whether the user
    /// exists or the password was wrong.
    #[error("Authentication failed")]
    AuthenticationFailure,

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Backing store unreachable or query failed (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Identity provider flow failure (502)
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Stable label for logs and the error counter metric.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::DuplicateIdentity => "duplicate_identity",
            AppError::AuthenticationFailure => "authentication_failure",
            AppError::Unauthorized => "unauthorized",
            AppError::Database(_) => "database",
            AppError::Provider(_) => "provider",
            AppError::HttpClient(_) => "http_client",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to an HTTP status code. Server-side
    /// variants never echo their detail to the client.
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateIdentity => (StatusCode::CONFLICT, self.to_string()),
            AppError::AuthenticationFailure => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Provider(_) | AppError::HttpClient(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream provider error".to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind()])
            .inc();

        (status, message).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
