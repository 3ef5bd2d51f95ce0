//! Authentication extractors
//!
//! The authenticated/anonymous gate for route handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::session::{SESSION_COOKIE, resolve_session};
use crate::AppState;
use crate::data::User;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Optional current user extractor
///
/// Resolves the session cookie to a user, or `None` when the request is
/// anonymous. Never rejects: an unknown, expired, or revoked token is
/// anonymous, and a store failure during resolution is logged and
/// treated the same rather than failing the request.
///
/// # Usage
/// ```ignore
/// async fn handler(MaybeUser(user): MaybeUser) -> impl IntoResponse {
///     match user {
///         Some(user) => ...,
///         None => Redirect::to("/login").into_response(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let app_state = AppState::from_ref(state);
        let user = match extract_token_from_headers(&parts.headers) {
            Some(token) => match resolve_session(
                &app_state.db,
                &app_state.config.auth.session_secret,
                &token,
            )
            .await
            {
                Ok(user) => user,
                Err(error) => {
                    tracing::warn!(%error, "Session resolution failed; treating as anonymous");
                    None
                }
            },
            None => None,
        };

        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}
