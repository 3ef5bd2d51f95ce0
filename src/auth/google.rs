//! Google OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with Google and
//! ends in an atomic find-or-create keyed on the provider subject id.
//! The provider's identity assertion is trusted once the code exchange
//! and userinfo fetch succeed.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::Deserialize;
use url::Url;

use super::session::{build_session_cookie, issue_session};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_SCOPES: &str = "openid profile";

/// Name of the CSRF state cookie
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Create the Google authentication router
///
/// Routes:
/// - GET /auth/google - Redirect to Google
/// - GET /auth/google/callback - OAuth callback
pub fn google_auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_redirect))
        .route("/auth/google/callback", get(google_callback))
}

/// GET /auth/google
///
/// Redirects the user to Google's authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to Google with client_id, redirect_uri, scope, state
async fn google_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let csrf_state = generate_csrf_state();

    let mut authorize_url = Url::parse(GOOGLE_AUTHORIZE_URL)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bad authorize URL: {e}")))?;
    authorize_url
        .query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &state.config.auth.google.client_id)
        .append_pair("redirect_uri", &callback_url(&state))
        .append_pair("scope", GOOGLE_SCOPES)
        .append_pair("state", &csrf_state);

    let jar = jar.add(build_state_cookie(
        csrf_state,
        state.config.should_use_secure_cookies(),
    ));

    Ok((jar, Redirect::to(authorize_url.as_str())))
}

/// Query parameters from the Google callback
#[derive(Debug, Deserialize)]
struct GoogleCallbackQuery {
    /// Authorization code (absent when the user denied access)
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
}

/// Google token response
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

/// Google userinfo payload
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    /// Stable subject identifier
    sub: String,
    #[allow(dead_code)]
    name: Option<String>,
}

/// GET /auth/google/callback
///
/// Handles the OAuth callback from Google. Any failure in the flow is
/// logged server-side and answered with a bare redirect to /login.
///
/// # Steps
/// 1. Verify CSRF state against the cookie
/// 2. Exchange code for access token
/// 3. Fetch userinfo from Google
/// 4. Find-or-create the user by subject id
/// 5. Create session and set cookie
/// 6. Redirect to /secrets
async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    // Read the expected state before the removal cookie shadows it.
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.add(clear_state_cookie());

    let user = match complete_callback(&state, &query, expected_state.as_deref()).await {
        Ok(user) => user,
        Err(error) => {
            tracing::warn!(%error, "Google callback failed");
            crate::metrics::observe_auth_attempt("google", "failure");
            return (jar, Redirect::to("/login"));
        }
    };

    let token = match issue_session(
        &state.db,
        &state.config.auth.session_secret,
        &user.id,
        state.config.auth.session_max_age,
    )
    .await
    {
        Ok(token) => token,
        Err(error) => {
            tracing::error!(%error, "Failed to issue session after Google login");
            return (jar, Redirect::to("/login"));
        }
    };

    crate::metrics::observe_auth_attempt("google", "success");
    crate::metrics::SESSIONS_ISSUED_TOTAL
        .with_label_values(&["google"])
        .inc();

    let jar = jar.add(build_session_cookie(
        token,
        state.config.should_use_secure_cookies(),
    ));
    (jar, Redirect::to("/secrets"))
}

async fn complete_callback(
    state: &AppState,
    query: &GoogleCallbackQuery,
    expected_state: Option<&str>,
) -> Result<User, AppError> {
    verify_csrf_state(query.state.as_deref(), expected_state)?;

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AppError::Provider("callback carried no authorization code".to_string()))?;

    let access_token = exchange_code(state, code).await?;
    let userinfo = fetch_userinfo(state, &access_token).await?;

    if userinfo.sub.is_empty() {
        return Err(AppError::Provider("userinfo carried no subject id".to_string()));
    }

    state.db.find_or_create_user_by_google_id(&userinfo.sub).await
}

/// Exchange the authorization code for an access token.
async fn exchange_code(state: &AppState, code: &str) -> Result<String, AppError> {
    let redirect_uri = callback_url(state);
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", state.config.auth.google.client_id.as_str()),
        (
            "client_secret",
            state.config.auth.google.client_secret.as_str(),
        ),
        ("redirect_uri", redirect_uri.as_str()),
    ];

    let response = state
        .http_client
        .post(GOOGLE_TOKEN_URL)
        .form(&params)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::Provider(format!(
            "token endpoint answered {}",
            response.status()
        )));
    }

    let token: GoogleTokenResponse = response.json().await?;
    Ok(token.access_token)
}

/// Fetch the authenticated user's profile.
async fn fetch_userinfo(state: &AppState, access_token: &str) -> Result<GoogleUserInfo, AppError> {
    let response = state
        .http_client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::Provider(format!(
            "userinfo endpoint answered {}",
            response.status()
        )));
    }

    Ok(response.json().await?)
}

fn callback_url(state: &AppState) -> String {
    format!("{}/auth/google/callback", state.config.server.base_url())
}

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify the CSRF state from the cookie matches the callback state
fn verify_csrf_state(presented: Option<&str>, expected: Option<&str>) -> Result<(), AppError> {
    let expected = expected
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Provider("missing CSRF state cookie".to_string()))?;

    match presented {
        Some(state) if state == expected => Ok(()),
        _ => Err(AppError::Provider("CSRF state mismatch".to_string())),
    }
}

fn build_state_cookie(csrf_state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path("/auth/google")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_state_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((OAUTH_STATE_COOKIE, "".to_string()))
        .path("/auth/google")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}
