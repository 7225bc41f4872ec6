//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use sqlite_store::health::check_connection;
use telemetry::health;

use crate::response::HealthResponse;
use crate::state::AppState;

/// Probe the database and record the result.
async fn probe_database(state: &AppState) -> bool {
    let ok = check_connection(&state.store).await;
    if ok {
        health().database.set_healthy();
    } else {
        health().database.set_unhealthy("SQLite connection check failed");
    }
    ok
}

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_connected = probe_database(&state).await;
    let report = health().report();

    let status = if report.status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            database_connected,
            summarizer_available: health().summarizer.is_healthy(),
            report,
        }),
    )
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    probe_database(&state).await;
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
