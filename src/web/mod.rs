//! Route layer
//!
//! Thin HTTP handlers over the accounts service. Every failure on a
//! browser-facing flow is logged server-side and answered with a bare
//! redirect, never with error detail.

mod pages;

use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::AppState;
use crate::auth::{
    MaybeUser, SESSION_COOKIE, build_session_cookie, clear_session_cookie, issue_session,
    revoke_session,
};
use crate::error::AppError;
use crate::metrics::{HTTP_REQUESTS_TOTAL, SESSIONS_ISSUED_TOTAL, observe_auth_attempt};
use crate::service::AccountService;

/// Create the page router
///
/// Routes:
/// - GET / - Home page
/// - GET/POST /register - Local registration
/// - GET/POST /login - Local login
/// - GET /logout - Clear session
/// - GET/POST /submit - Submit a secret (requires authentication)
/// - GET /secrets - Public listing of all stored secrets
pub fn web_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/register", get(register_form))
        .route("/register", post(handle_register))
        .route("/login", get(login_form))
        .route("/login", post(handle_login))
        .route("/logout", get(handle_logout))
        .route("/submit", get(submit_form))
        .route("/submit", post(handle_submit))
        .route("/secrets", get(list_secrets))
}

fn accounts(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone(), state.config.auth.bcrypt_cost)
}

// =============================================================================
// Pages
// =============================================================================

/// GET /
async fn home() -> Html<String> {
    Html(pages::home_page())
}

/// GET /register
async fn register_form() -> Html<String> {
    Html(pages::register_page())
}

/// GET /login
async fn login_form() -> Html<String> {
    Html(pages::login_page())
}

/// GET /submit
///
/// Requires an authenticated session; anonymous callers are sent to
/// the login page.
async fn submit_form(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(_) => Html(pages::submit_page()).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// GET /secrets
///
/// Public listing of everyone's secrets.
async fn list_secrets(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let users = accounts(&state).list_secrets().await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/secrets", "200"])
        .inc();

    Ok(Html(pages::secrets_page(&users)))
}

// =============================================================================
// Local registration and login
// =============================================================================

/// Local credentials form payload
#[derive(Debug, Deserialize)]
struct CredentialsForm {
    username: String,
    password: String,
}

/// POST /register
///
/// Registers and logs the new user straight in. Failures redirect back
/// to the registration page.
async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> (CookieJar, Redirect) {
    let user_id = match accounts(&state).register(&form.username, &form.password).await {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::warn!(kind = error.kind(), "Registration failed");
            observe_auth_attempt("register", "failure");
            return (jar, Redirect::to("/register"));
        }
    };

    observe_auth_attempt("register", "success");
    start_session(state, jar, &user_id.0, "register").await
}

/// POST /login
///
/// Verifies local credentials. Failures redirect back to the login
/// page without saying what went wrong.
async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> (CookieJar, Redirect) {
    let user_id = match accounts(&state)
        .verify_login(&form.username, &form.password)
        .await
    {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::warn!(kind = error.kind(), "Login failed");
            observe_auth_attempt("login", "failure");
            return (jar, Redirect::to("/login"));
        }
    };

    observe_auth_attempt("login", "success");
    start_session(state, jar, &user_id.0, "login").await
}

/// Issue a session for an authenticated user and send them to the
/// secrets page.
async fn start_session(
    state: AppState,
    jar: CookieJar,
    user_id: &str,
    flow: &str,
) -> (CookieJar, Redirect) {
    let token = match issue_session(
        &state.db,
        &state.config.auth.session_secret,
        user_id,
        state.config.auth.session_max_age,
    )
    .await
    {
        Ok(token) => token,
        Err(error) => {
            tracing::error!(kind = error.kind(), %flow, "Failed to issue session");
            return (jar, Redirect::to("/login"));
        }
    };

    SESSIONS_ISSUED_TOTAL.with_label_values(&[flow]).inc();

    let jar = jar.add(build_session_cookie(
        token,
        state.config.should_use_secure_cookies(),
    ));
    (jar, Redirect::to("/secrets"))
}

// =============================================================================
// Logout
// =============================================================================

/// GET /logout
///
/// Revokes the server-side session and clears the cookie. The same
/// cookie presented again resolves to anonymous.
async fn handle_logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(error) = revoke_session(
            &state.db,
            &state.config.auth.session_secret,
            cookie.value(),
        )
        .await
        {
            tracing::error!(kind = error.kind(), "Failed to revoke session on logout");
        }
    }

    (jar.add(clear_session_cookie()), Redirect::to("/"))
}

// =============================================================================
// Secret submission
// =============================================================================

/// Secret form payload
#[derive(Debug, Deserialize)]
struct SecretForm {
    secret: String,
}

/// POST /submit
///
/// Overwrites the caller's secret. Anonymous callers are redirected to
/// the login page before anything touches the store.
async fn handle_submit(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<SecretForm>,
) -> Redirect {
    let Some(user) = user else {
        return Redirect::to("/login");
    };

    match accounts(&state).submit_secret(&user.id(), &form.secret).await {
        Ok(()) => Redirect::to("/secrets"),
        Err(error) => {
            tracing::warn!(kind = error.kind(), user_id = %user.id, "Secret submission failed");
            Redirect::to("/submit")
        }
    }
}
