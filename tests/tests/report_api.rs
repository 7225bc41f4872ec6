//! Tests for `GET /api/report` and `GET /report`.

use axum::http::StatusCode;
use integration_tests::{fixtures, mocks::MockSummarizer, setup::TestContext};
use serde_json::{json, Value};

/// First call on an empty store creates exactly one report
#[tokio::test]
async fn test_first_report_is_created() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/report").await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["id"].as_str().is_some());
    assert!(body["createdAt"].as_str().is_some());
    assert_eq!(body["data"]["totalSessions"], 0);
    assert_eq!(body["data"]["totalEvents"], 0);
    assert_eq!(ctx.report_count().await, 1);
}

/// A fresh report is served again without regeneration
#[tokio::test]
async fn test_fresh_report_is_cached() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let first: Value = server.get("/api/report").await.json();

    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::OK);
    let second: Value = response.json();

    assert_eq!(first, second);
    assert_eq!(ctx.report_count().await, 1);
}

/// `/report` serves the same report as `/api/report`
#[tokio::test]
async fn test_report_alias() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let first: Value = server.get("/report").await.json();
    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["id"], first["id"]);
}

/// Raw aggregate counts events per type for each session
#[tokio::test]
async fn test_aggregate_counts_by_type() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let mut events = fixtures::events_of_type(3, "CLICK");
    events.extend(fixtures::events_of_type(2, "SCROLL"));
    fixtures::log_events(&server, &session_id, events).await;

    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();

    assert_eq!(body["data"]["totalSessions"], 1);
    assert_eq!(body["data"]["totalEvents"], 5);
    let session = &body["data"]["sessions"][0];
    assert_eq!(session["sessionId"], session_id.as_str());
    assert_eq!(session["totalEvents"], 5);
    assert_eq!(session["eventsByType"], json!({ "CLICK": 3, "SCROLL": 2 }));
    assert_eq!(session["events"].as_array().unwrap().len(), 5);
}

/// Sessions without events still appear in the aggregate
#[tokio::test]
async fn test_aggregate_includes_empty_sessions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    fixtures::create_session(&server).await;
    fixtures::create_session(&server).await;

    let body: Value = server.get("/api/report").await.json();
    assert_eq!(body["data"]["totalSessions"], 2);
    assert_eq!(body["data"]["sessions"][1]["eventsByType"], json!({}));
}

/// Fenced summary JSON becomes the report payload
#[tokio::test]
async fn test_summary_becomes_payload() {
    let mock = MockSummarizer::replying(fixtures::fenced_summary("Visitors bounce on pricing"));
    let ctx = TestContext::builder().summarizer(mock).build().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;
    fixtures::log_events(&server, &session_id, fixtures::events_of_type(2, "click")).await;

    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();

    assert_eq!(body["data"]["summary"], "Visitors bounce on pricing");
    assert_eq!(body["data"]["pageViews"]["total"], 3);

    let mock = ctx.summarizer.as_ref().unwrap();
    assert_eq!(mock.call_count(), 1);
    assert!(mock.prompts()[0].contains(&session_id));
}

/// Cached reports do not call the summarizer again
#[tokio::test]
async fn test_cached_report_skips_summarizer() {
    let mock = MockSummarizer::replying(fixtures::fenced_summary("steady"));
    let ctx = TestContext::builder().summarizer(mock).build().await;
    let server = ctx.server();

    server.get("/api/report").await.assert_status(StatusCode::CREATED);
    server.get("/api/report").await.assert_status(StatusCode::OK);

    assert_eq!(ctx.summarizer.as_ref().unwrap().call_count(), 1);
}

/// Unparseable summarizer text stores a null payload
#[tokio::test]
async fn test_unparseable_summary_stores_null() {
    let mock = MockSummarizer::replying("Traffic looks healthy overall.");
    let ctx = TestContext::builder().summarizer(mock).build().await;
    let server = ctx.server();

    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["data"].is_null());
    assert!(body["id"].as_str().is_some());
    assert_eq!(ctx.report_count().await, 1);
}

/// A failing summarizer still produces a report
#[tokio::test]
async fn test_failing_summarizer_stores_null() {
    let ctx = TestContext::builder()
        .summarizer(MockSummarizer::failing())
        .build()
        .await;
    let server = ctx.server();

    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::CREATED);
    assert!(response.json::<Value>()["data"].is_null());
}

/// Structured mode parses the whole reply as JSON
#[tokio::test]
async fn test_structured_summary() {
    let mock = MockSummarizer::replying(r#"{"summary": "structured", "recommendations": []}"#)
        .structured();
    let ctx = TestContext::builder().summarizer(mock).build().await;
    let server = ctx.server();

    let body: Value = server.get("/api/report").await.json();
    assert_eq!(body["data"]["summary"], "structured");
}

/// Stale reports are replaced by a new one
#[tokio::test]
async fn test_stale_report_regenerates() {
    let ctx = TestContext::builder().freshness_minutes(0).build().await;
    let server = ctx.server();

    let first: Value = server.get("/api/report").await.json();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let response = server.get("/api/report").await;
    response.assert_status(StatusCode::OK);
    let second: Value = response.json();

    assert_ne!(first["id"], second["id"]);
    assert_eq!(ctx.report_count().await, 2);
}

/// Regenerated reports see events logged since the last one
#[tokio::test]
async fn test_regenerated_report_sees_new_events() {
    let ctx = TestContext::builder().freshness_minutes(0).build().await;
    let server = ctx.server();
    let session_id = fixtures::create_session(&server).await;

    let first: Value = server.get("/api/report").await.json();
    assert_eq!(first["data"]["totalEvents"], 0);

    fixtures::log_events(&server, &session_id, fixtures::events_of_type(4, "hover")).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let second: Value = server.get("/api/report").await.json();
    assert_eq!(second["data"]["totalEvents"], 4);
}
