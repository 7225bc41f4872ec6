//! Tests for users, login and projects.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};

/// Creating a user returns its id
#[tokio::test]
async fn test_create_user() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/users")
        .json(&json!({ "email": "ada@example.com", "password": "lovelace", "name": "Ada" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["id"].as_str().is_some());
    assert!(body.get("passwordHash").is_none());
}

/// Duplicate emails conflict
#[tokio::test]
async fn test_duplicate_email_returns_409() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let body = json!({ "email": "dup@example.com", "password": "secret" });

    server.post("/api/users").json(&body).await.assert_status(StatusCode::CREATED);
    let response = server.post("/api/users").json(&body).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["success"], false);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("email already registered"));
    assert!(!message.contains("UNIQUE"));
    assert!(!message.contains("users."));
}

/// Missing credentials are a validation error
#[tokio::test]
async fn test_create_user_missing_fields() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for body in [json!({ "email": "a@example.com" }), json!({ "password": "pw" })] {
        let response = server.post("/api/users").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "VALID_001");
    }
}

/// Correct credentials log in
#[tokio::test]
async fn test_login() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let created: Value = server
        .post("/api/users")
        .json(&json!({ "email": "grace@example.com", "password": "cobol" }))
        .await
        .json();

    let response = server
        .post("/api/login")
        .json(&json!({ "email": "grace@example.com", "password": "cobol" }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["userId"], created["id"]);
}

/// Wrong password and unknown email look the same
#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/api/users")
        .json(&json!({ "email": "linus@example.com", "password": "right" }))
        .await
        .assert_status(StatusCode::CREATED);

    let wrong_password = server
        .post("/api/login")
        .json(&json!({ "email": "linus@example.com", "password": "wrong" }))
        .await;
    let unknown_email = server
        .post("/api/login")
        .json(&json!({ "email": "nobody@example.com", "password": "right" }))
        .await;

    for response in [wrong_password, unknown_email] {
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "AUTH_004");
        assert_eq!(body["error"], "Invalid email or password");
    }
}

/// Projects get a live API key
#[tokio::test]
async fn test_create_project() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let (_, project_id, api_key) = fixtures::create_project(&server).await;

    assert!(!project_id.is_empty());
    assert!(api_key.starts_with("ak_live_"));
    assert_eq!(api_key.len(), "ak_live_".len() + 32);
    assert!(collector_core::ParsedApiKey::parse(&api_key).is_ok());
}

/// Projects need an existing owner
#[tokio::test]
async fn test_project_with_unknown_owner_returns_404() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/projects")
        .json(&json!({ "ownerId": "ghost", "name": "Orphan" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}

/// Project name is required
#[tokio::test]
async fn test_project_missing_name_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/projects")
        .json(&json!({ "ownerId": "someone" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");
}
