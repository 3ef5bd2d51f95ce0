//! Inline HTML pages
//!
//! No templating engine; pages are small enough to build with format!
//! and html-escape, the same way the OAuth consent screen of a larger
//! app would be.

use crate::data::User;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{} - Hushboard</title>
</head>
<body>
{}
</body>
</html>"#,
        html_escape::encode_text(title),
        body
    )
}

pub fn home_page() -> String {
    page(
        "Home",
        r#"  <h1>Hushboard</h1>
  <p>Don't keep your secrets, share them anonymously!</p>
  <p><a href="/register">Register</a> or <a href="/login">Login</a></p>"#,
    )
}

pub fn register_page() -> String {
    page(
        "Register",
        r#"  <h1>Register</h1>
  <form method="post" action="/register">
    <label>Username <input type="text" name="username" autocomplete="username" /></label>
    <label>Password <input type="password" name="password" autocomplete="new-password" /></label>
    <button type="submit">Register</button>
  </form>
  <p><a href="/auth/google">Sign up with Google</a></p>"#,
    )
}

pub fn login_page() -> String {
    page(
        "Login",
        r#"  <h1>Login</h1>
  <form method="post" action="/login">
    <label>Username <input type="text" name="username" autocomplete="username" /></label>
    <label>Password <input type="password" name="password" autocomplete="current-password" /></label>
    <button type="submit">Login</button>
  </form>
  <p><a href="/auth/google">Sign in with Google</a></p>"#,
    )
}

pub fn submit_page() -> String {
    page(
        "Submit a Secret",
        r#"  <h1>Submit a Secret</h1>
  <form method="post" action="/submit">
    <label>Your secret <input type="text" name="secret" /></label>
    <button type="submit">Submit</button>
  </form>
  <p><a href="/secrets">Back to secrets</a></p>"#,
    )
}

/// The public listing. Secrets are shown without attribution.
pub fn secrets_page(users: &[User]) -> String {
    let mut items = String::new();
    for user in users {
        if let Some(secret) = user.secret.as_deref() {
            items.push_str(&format!(
                "    <li>{}</li>\n",
                html_escape::encode_text(secret)
            ));
        }
    }

    let body = format!(
        r#"  <h1>You've Discovered Everyone's Secrets!</h1>
  <ul>
{}  </ul>
  <p><a href="/submit">Submit a secret</a> | <a href="/logout">Log out</a></p>"#,
        items
    );
    page("Secrets", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_secret(secret: &str) -> User {
        let now = Utc::now();
        User {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            username: Some("alice".to_string()),
            password_hash: Some("$2b$04$hash".to_string()),
            google_id: None,
            secret: Some(secret.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn secrets_page_escapes_html() {
        let html = secrets_page(&[user_with_secret("<script>alert(1)</script>")]);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn secrets_page_omits_attribution() {
        let html = secrets_page(&[user_with_secret("my secret")]);
        assert!(html.contains("my secret"));
        assert!(!html.contains("alice"));
    }
}
