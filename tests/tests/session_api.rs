//! Tests for `POST /api/session`.

use axum::http::StatusCode;
use collector_core::{DeviceInfo, UNKNOWN};
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};
use sqlite_store::find_session;
use std::collections::HashSet;

/// Success echoes the anonymous id and returns a new id
#[tokio::test]
async fn test_create_session_echoes_anonymous_id() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .json(&json!({ "anonymousId": "visitor-42", "metadata": { "page": "/" } }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["anonymousId"], "visitor-42");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
}

/// Every session gets a previously unseen id
#[tokio::test]
async fn test_session_ids_are_unique() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let mut seen = HashSet::new();
    for _ in 0..20 {
        let id = fixtures::create_session(&server).await;
        assert!(seen.insert(id), "session id was reused");
    }
}

/// Metadata is stored exactly as sent
#[tokio::test]
async fn test_metadata_stored_verbatim() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let metadata = json!({
        "page": "/checkout",
        "screen": { "width": 1440, "height": 900 },
        "tags": ["a", "b"],
        "returning": true
    });

    let response = server
        .post("/api/session")
        .json(&json!({ "anonymousId": "anon", "metadata": metadata.clone(), "userId": "user-7" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let session = find_session(&ctx.store, &id).await.unwrap().unwrap();
    assert_eq!(session.metadata, metadata);
    assert_eq!(session.user_id.as_deref(), Some("user-7"));
    assert!(session.project_id.is_none());
}

/// Null metadata is accepted
#[tokio::test]
async fn test_session_without_metadata() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .json(&json!({ "anonymousId": "anon" }))
        .await;
    response.assert_status(StatusCode::CREATED);
}

/// Empty body object returns 400 VALID_001
#[tokio::test]
async fn test_empty_body_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.post("/api/session").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALID_001");
    assert!(body["error"].as_str().unwrap().contains("anonymousId"));
}

/// Blank anonymous id counts as missing
#[tokio::test]
async fn test_blank_anonymous_id_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .json(&json!({ "anonymousId": "   " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

/// Malformed JSON returns 400 VALID_002 in the standard error shape
#[tokio::test]
async fn test_invalid_json_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .content_type("application/json")
        .bytes(r#"{"anonymousId": "#.into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALID_002");
}

/// Oversized anonymous id returns VALID_003
#[tokio::test]
async fn test_anonymous_id_too_long() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .json(&json!({ "anonymousId": "x".repeat(129) }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_003");
}

/// Device fields come from the User-Agent header
#[tokio::test]
async fn test_device_parsed_from_user_agent_header() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .add_header("User-Agent", fixtures::CHROME_MAC)
        .json(&fixtures::session_body())
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let session = find_session(&ctx.store, &id).await.unwrap().unwrap();
    assert_eq!(session.device.browser, "Chrome");
    assert_eq!(session.device.os, "Mac OSX");
    assert_eq!(session.device.device, "desktop");
}

/// Without any user agent the device is unknown
#[tokio::test]
async fn test_device_unknown_without_user_agent() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let id = fixtures::create_session(&server).await;
    let session = find_session(&ctx.store, &id).await.unwrap().unwrap();
    // axum-test sends no User-Agent by default.
    assert_eq!(session.device.os, UNKNOWN);
    assert_eq!(session.device, DeviceInfo::default());
}

/// A valid API key scopes the session to its project
#[tokio::test]
async fn test_api_key_scopes_session_to_project() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, project_id, api_key) = fixtures::create_project(&server).await;

    let response = server
        .post("/api/session")
        .add_header("Authorization", format!("Bearer {}", api_key))
        .json(&fixtures::session_body())
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let session = find_session(&ctx.store, &id).await.unwrap().unwrap();
    assert_eq!(session.project_id.as_deref(), Some(project_id.as_str()));

    // Same key through X-API-Key.
    let response = server
        .post("/api/session")
        .add_header("X-API-Key", api_key)
        .json(&fixtures::session_body())
        .await;
    response.assert_status(StatusCode::CREATED);
}

/// Malformed API key returns AUTH_002
#[tokio::test]
async fn test_malformed_api_key_returns_401() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .add_header("X-API-Key", "not-a-key")
        .json(&fixtures::session_body())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "AUTH_002");
}

/// Well-formed but unknown API key returns AUTH_003
#[tokio::test]
async fn test_unknown_api_key_returns_401() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/session")
        .add_header("X-API-Key", format!("ak_live_{}", "Z".repeat(32)))
        .json(&fixtures::session_body())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_003");
    assert_eq!(body["success"], false);
}
