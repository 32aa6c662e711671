//! E2E tests for message creation, display and deletion

mod common;

use common::{TestServer, no_redirect_client};

#[tokio::test]
async fn test_add_message() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let response = client
        .post(server.url("/messages/new"))
        .form(&[("text", "Hello")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let messages = server.state.db.get_messages_for_user(user.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Hello");
}

#[tokio::test]
async fn test_add_message_redirects_to_profile() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = no_redirect_client();

    let response = client
        .post(server.url("/messages/new"))
        .header("Cookie", format!("curr_user={}", server.session_token(user.id)))
        .form(&[("text", "Hello")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 302);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, format!("/users/{}", user.id));
}

#[tokio::test]
async fn test_add_message_requires_login() {
    let server = TestServer::new().await;
    server
        .create_test_user("testuser", "test@test.com", "password")
        .await;

    let response = server
        .client
        .post(server.url("/messages/new"))
        .form(&[("text", "Hello")])
        .send()
        .await
        .unwrap();

    // Redirected home with the warning flash
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_add_message_with_stale_session() {
    let server = TestServer::new().await;
    server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    // Valid signature over an id that resolves to no user
    let client = server.session_client(99222224);

    let response = client
        .post(server.url("/messages/new"))
        .form(&[("text", "Hello")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_add_empty_message_rerenders_form() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let response = client
        .post(server.url("/messages/new"))
        .form(&[("text", "   ")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Message text is required."));
    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_add_overlong_message_is_rejected() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let text = "x".repeat(141);
    let response = client
        .post(server.url("/messages/new"))
        .form(&[("text", text.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(server.state.db.count_messages().await.unwrap(), 0);
}

#[tokio::test]
async fn test_new_message_form_renders() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let response = client
        .get(server.url("/messages/new"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Add my message!"));
}

#[tokio::test]
async fn test_message_show() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let message = server.post_test_message(user.id, "a warble to show").await;
    let client = server.session_client(user.id);

    let response = client
        .get(server.url(&format!("/messages/{}", message.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("a warble to show"));
    assert!(body.contains("@testuser"));
}

#[tokio::test]
async fn test_message_show_requires_login() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let message = server.post_test_message(user.id, "a warble").await;

    let response = server
        .client
        .get(server.url(&format!("/messages/{}", message.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
}

#[tokio::test]
async fn test_invalid_message_show() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let response = client
        .get(server.url("/messages/99999999"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_message_delete() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let message = server.post_test_message(user.id, "doomed warble").await;
    let client = no_redirect_client();

    let response = client
        .post(server.url(&format!("/messages/{}/delete", message.id)))
        .header("Cookie", format!("curr_user={}", server.session_token(user.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 302);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, format!("/users/{}", user.id));

    assert!(
        server
            .state
            .db
            .get_message(message.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_unauthorized_message_delete() {
    let server = TestServer::new().await;
    let author = server
        .create_test_user("author", "author@test.com", "password")
        .await;
    let intruder = server
        .create_test_user("intruder", "intruder@test.com", "password")
        .await;
    let message = server.post_test_message(author.id, "not yours").await;

    let client = server.session_client(intruder.id);
    let response = client
        .post(server.url(&format!("/messages/{}/delete", message.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
    assert!(
        server
            .state
            .db
            .get_message(message.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_message_delete_requires_login() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let message = server.post_test_message(user.id, "still here").await;

    let response = server
        .client
        .post(server.url(&format!("/messages/{}/delete", message.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Access unauthorized."));
    assert!(
        server
            .state
            .db
            .get_message(message.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_delete_unknown_message_is_404() {
    let server = TestServer::new().await;
    let user = server
        .create_test_user("testuser", "test@test.com", "password")
        .await;
    let client = server.session_client(user.id);

    let response = client
        .post(server.url("/messages/99999999/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}
