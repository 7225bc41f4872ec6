//! Client-side error intake. Logged, never stored.

use axum::{http::StatusCode, Json};
use serde_json::Value;
use telemetry::metrics;
use tracing::warn;

use crate::extractors::{ClientIp, JsonBody};
use crate::response::Accepted;

/// POST /api/error
pub async fn report_client_error(
    ClientIp(client_ip): ClientIp,
    JsonBody(payload): JsonBody<Value>,
) -> (StatusCode, Json<Accepted>) {
    metrics().client_errors_reported.inc();
    warn!(client_ip = ?client_ip, error = %payload, "Client reported an error");

    (StatusCode::ACCEPTED, Json(Accepted { success: true }))
}
