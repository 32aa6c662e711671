//! E2E tests for signup, login, logout and the home feed

mod common;

use common::{TestServer, no_redirect_client};

#[tokio::test]
async fn test_home_anonymous_shows_landing_page() {
    let server = TestServer::new().await;

    let response = server.client.get(server.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("What's Happening?"));
    assert!(body.contains("/signup"));
}

#[tokio::test]
async fn test_signup_page_renders() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/signup"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Join Warbler today."));
}

#[tokio::test]
async fn test_signup_creates_user_and_logs_in() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/signup"))
        .form(&[
            ("username", "testuser"),
            ("email", "testuser@test.com"),
            ("password", "testpassword"),
        ])
        .send()
        .await
        .unwrap();

    // The redirect was followed to the home feed
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Add my message!"));

    let user = server
        .state
        .db
        .get_user_by_username("testuser")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "testuser@test.com");
    assert_ne!(user.password_hash, "testpassword");
}

#[tokio::test]
async fn test_signup_redirect_sets_session_cookie() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .post(server.url("/signup"))
        .form(&[
            ("username", "testuser"),
            ("email", "testuser@test.com"),
            ("password", "testpassword"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 302);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/");

    let set_cookie_values: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect();
    assert!(
        set_cookie_values.iter().any(|v| v.starts_with("curr_user=")),
        "expected a session cookie, got: {set_cookie_values:?}"
    );
}

#[tokio::test]
async fn test_signup_duplicate_username_rerenders_form() {
    let server = TestServer::new().await;
    server
        .create_test_user("testuser", "original@test.com", "password")
        .await;

    let response = server
        .client
        .post(server.url("/signup"))
        .form(&[
            ("username", "testuser"),
            ("email", "other@test.com"),
            ("password", "password"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Username already taken"));
    assert_eq!(server.state.db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_signup_empty_password_rerenders_form() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/signup"))
        .form(&[
            ("username", "testuser"),
            ("email", "testuser@test.com"),
            ("password", ""),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("password must be non-empty"));
    assert_eq!(server.state.db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_page_renders() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/login"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Welcome back."));
}

#[tokio::test]
async fn test_login_flashes_greeting_on_home() {
    let server = TestServer::new().await;
    server
        .create_test_user("user1", "user1@test.com", "password")
        .await;

    let response = server
        .client
        .post(server.url("/login"))
        .form(&[("username", "user1"), ("password", "password")])
        .send()
        .await
        .unwrap();

    // 302 to "/", followed; the flash renders once on the feed
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Hello, user1!"));
    assert!(body.contains("Add my message!"));

    // The flash is one-shot
    let again = server.client.get(server.url("/")).send().await.unwrap();
    let body = again.text().await.unwrap();
    assert!(!body.contains("Hello, user1!"));
}

#[tokio::test]
async fn test_login_wrong_password_rerenders_form() {
    let server = TestServer::new().await;
    server
        .create_test_user("user1", "user1@test.com", "password")
        .await;

    let response = server
        .client
        .post(server.url("/login"))
        .form(&[("username", "user1"), ("password", "wrongpassword")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid credentials."));
}

#[tokio::test]
async fn test_login_unknown_username_rerenders_form() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/login"))
        .form(&[("username", "nobody"), ("password", "password")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid credentials."));
}

#[tokio::test]
async fn test_logout_clears_session_and_flashes() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("user1", "user1@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let response = client.get(server.url("/logout")).send().await.unwrap();

    // Landed on the login page with the goodbye flash
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("You have successfully logged out."));

    // The session cookie is gone: home renders the landing page again
    let home = client.get(server.url("/")).send().await.unwrap();
    let body = home.text().await.unwrap();
    assert!(body.contains("What's Happening?"));
}

#[tokio::test]
async fn test_logout_without_session_is_unauthorized() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/logout"))
        .send()
        .await
        .unwrap();

    // Redirected home with the warning flash
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
}

#[tokio::test]
async fn test_session_for_deleted_user_is_unauthorized() {
    let server = TestServer::new().await;
    let client = server.session_client(99222224);

    let response = client.get(server.url("/logout")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
}

#[tokio::test]
async fn test_home_feed_scope() {
    let server = TestServer::new().await;
    let u1 = server
        .create_test_user("user1", "user1@test.com", "password")
        .await;
    let u2 = server
        .create_test_user("user2", "user2@test.com", "password")
        .await;
    let u3 = server
        .create_test_user("user3", "user3@test.com", "password")
        .await;

    server.state.db.insert_follow(u1.id, u2.id).await.unwrap();
    server.post_test_message(u1.id, "my own warble").await;
    server.post_test_message(u2.id, "followed warble").await;
    server.post_test_message(u3.id, "stranger warble").await;

    let client = server.session_client(u1.id);
    let response = client.get(server.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("my own warble"));
    assert!(body.contains("followed warble"));
    assert!(!body.contains("stranger warble"));
}
