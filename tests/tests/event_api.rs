//! Tests for `POST /api/event`.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};
use sqlite_store::events_for_session;

/// Logged events are counted and persisted against the session
#[tokio::test]
async fn test_log_events_persists_every_row() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let response = server
        .post("/api/event")
        .json(&fixtures::event_batch(
            &session_id,
            fixtures::events_of_type(7, "click"),
        ))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["eventsProcessed"], 7);
    assert_eq!(body["sessionId"], session_id.as_str());

    let stored = events_for_session(&ctx.store, &session_id).await.unwrap();
    assert_eq!(stored.len(), 7);
    assert!(stored.iter().all(|e| e.session_id == session_id));
}

/// Known fields are mapped and extra fields are kept
#[tokio::test]
async fn test_event_fields_stored() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    fixtures::log_events(
        &server,
        &session_id,
        vec![
            json!({ "type": "SCROLL", "scrollOffset": 640.5 }),
            json!({ "type": "CLICK", "elementId": "buy", "x": 10, "y": 20, "variant": "b" }),
        ],
    )
    .await;

    let stored = events_for_session(&ctx.store, &session_id).await.unwrap();
    assert_eq!(stored[0].event_type, "SCROLL");
    assert_eq!(stored[0].scroll_offset, Some(640.5));
    assert_eq!(stored[1].element_id.as_deref(), Some("buy"));
    assert_eq!(stored[1].x, Some(10.0));
    assert_eq!(stored[1].properties["variant"], "b");
}

/// Unknown session returns 404 regardless of payload
#[tokio::test]
async fn test_unknown_session_returns_404() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for events in [
        fixtures::events_of_type(2, "click"),
        vec![json!("not an object"), json!({ "type": 5 })],
        vec![],
    ] {
        let response = server
            .post("/api/event")
            .json(&fixtures::event_batch("no-such-session", events))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

/// Missing sessionId returns 400
#[tokio::test]
async fn test_missing_session_id_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/event")
        .json(&json!({ "events": [fixtures::event("click")] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");
}

/// Missing events array returns 400
#[tokio::test]
async fn test_missing_events_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let response = server
        .post("/api/event")
        .json(&json!({ "sessionId": session_id }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");
}

/// One malformed event fails the whole batch with nothing written
#[tokio::test]
async fn test_malformed_event_writes_nothing() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let mut events = fixtures::events_of_type(3, "click");
    events.push(json!({ "elementId": "no-type" }));

    let response = server
        .post("/api/event")
        .json(&fixtures::event_batch(&session_id, events))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INTERNAL");
    assert_eq!(ctx.event_count(&session_id).await, 0);
}

/// Wrongly typed known field is malformed too
#[tokio::test]
async fn test_wrongly_typed_field_writes_nothing() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let response = server
        .post("/api/event")
        .json(&fixtures::event_batch(
            &session_id,
            vec![fixtures::event("click"), json!({ "type": "click", "x": "left" })],
        ))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ctx.event_count(&session_id).await, 0);
}

/// Batches over the limit are rejected before anything is stored
#[tokio::test]
async fn test_oversized_batch_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let response = server
        .post("/api/event")
        .json(&fixtures::event_batch(
            &session_id,
            fixtures::events_of_type(1001, "scroll"),
        ))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_003");
    assert_eq!(ctx.event_count(&session_id).await, 0);
}

/// Batch at the limit is accepted
#[tokio::test]
async fn test_full_batch_accepted() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let response = server
        .post("/api/event")
        .json(&fixtures::event_batch(
            &session_id,
            fixtures::events_of_type(1000, "scroll"),
        ))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["eventsProcessed"], 1000);
    assert_eq!(ctx.event_count(&session_id).await, 1000);
}

/// Empty batch is a no-op success
#[tokio::test]
async fn test_empty_batch() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let response = server
        .post("/api/event")
        .json(&fixtures::event_batch(&session_id, vec![]))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["eventsProcessed"], 0);
}
