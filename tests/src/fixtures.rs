//! Test fixtures and request helpers.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

pub const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A `createSession` body with a unique anonymous id.
pub fn session_body() -> Value {
    json!({
        "anonymousId": format!("anon-{}", Uuid::new_v4()),
        "metadata": { "page": "/pricing", "locale": "en-US" }
    })
}

/// One client event of the given type.
pub fn event(event_type: &str) -> Value {
    json!({
        "type": event_type,
        "elementId": "cta-button",
        "x": 120,
        "y": 48,
        "url": "https://example.com/pricing"
    })
}

/// `n` events of the given type.
pub fn events_of_type(n: usize, event_type: &str) -> Vec<Value> {
    (0..n).map(|_| event(event_type)).collect()
}

/// A `logEvent` body.
pub fn event_batch(session_id: &str, events: Vec<Value>) -> Value {
    json!({ "sessionId": session_id, "events": events })
}

/// Summarizer reply with one fenced JSON block.
pub fn fenced_summary(summary: &str) -> String {
    format!(
        "Here is the analysis you asked for.\n```json\n{}\n```\nLet me know if you need more.",
        json!({
            "pageViews": { "total": 3, "unique": 1 },
            "conversionFunnel": [],
            "topPages": [{ "path": "/pricing", "views": 3 }],
            "userPersonas": [],
            "summary": summary,
            "recommendations": ["Shorten the signup form"]
        })
    )
}

/// Create a session through the API and return its id.
pub async fn create_session(server: &TestServer) -> String {
    let response = server.post("/api/session").json(&session_body()).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_str().expect("session id").to_string()
}

/// Log events through the API, asserting success.
pub async fn log_events(server: &TestServer, session_id: &str, events: Vec<Value>) {
    let response = server
        .post("/api/event")
        .json(&event_batch(session_id, events))
        .await;
    response.assert_status(StatusCode::CREATED);
}

/// Create a user and a project, returning `(owner_id, project_id, api_key)`.
pub async fn create_project(server: &TestServer) -> (String, String, String) {
    let email = format!("owner-{}@example.com", Uuid::new_v4());
    let response = server
        .post("/api/users")
        .json(&json!({ "email": email, "password": "hunter22", "name": "Owner" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let owner_id = response.json::<Value>()["id"]
        .as_str()
        .expect("user id")
        .to_string();

    let response = server
        .post("/api/projects")
        .json(&json!({ "ownerId": owner_id, "name": "Landing page" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();

    (
        owner_id,
        body["id"].as_str().expect("project id").to_string(),
        body["apiKey"].as_str().expect("api key").to_string(),
    )
}
