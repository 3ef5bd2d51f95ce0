//! E2E tests for the Google OAuth endpoints and the find-or-create
//! invariant behind them

mod common;

use common::{TestServer, location, no_redirect_client};

#[tokio::test]
async fn test_google_redirect_sets_csrf_cookie_and_redirects() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/auth/google"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = location(&response);
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("scope=openid"));
    assert!(location.contains("state="));
    assert!(location.contains("redirect_uri="));

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    assert!(set_cookie.contains("oauth_state="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_google_callback_rejects_missing_csrf_cookie() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/auth/google/callback?code=dummy&state=dummy"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
    assert_eq!(server.state.db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_google_callback_rejects_state_mismatch() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/auth/google/callback?code=dummy&state=attacker-state"))
        .header("Cookie", "oauth_state=legitimate-state")
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
    assert_eq!(server.state.db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_find_or_create_is_idempotent() {
    let server = TestServer::new().await;
    let db = &server.state.db;

    let first = db
        .find_or_create_user_by_google_id("subject-123")
        .await
        .unwrap();
    let second = db
        .find_or_create_user_by_google_id("subject-123")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.google_id.as_deref(), Some("subject-123"));
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_or_create_creates_at_most_one_record_concurrently() {
    let server = TestServer::new().await;
    let db = server.state.db.clone();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.find_or_create_user_by_google_id("racy-subject").await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let user = handle.await.expect("task completes").expect("find-or-create succeeds");
        ids.push(user.id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "all callers should resolve to the same user");
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_or_create_never_touches_other_subjects() {
    let server = TestServer::new().await;
    let db = &server.state.db;

    let a = db.find_or_create_user_by_google_id("subject-a").await.unwrap();
    let b = db.find_or_create_user_by_google_id("subject-b").await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(db.count_users().await.unwrap(), 2);

    // A repeat login for one subject does not modify the other's record.
    let a_again = db.find_or_create_user_by_google_id("subject-a").await.unwrap();
    assert_eq!(a_again.id, a.id);
    assert_eq!(a_again.updated_at, a.updated_at);
}
