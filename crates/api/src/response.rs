//! Standardized API responses.
//!
//! Every failure leaves the API as `{ "success": false, "error", "code" }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use collector_core::Error;
use serde::{Deserialize, Serialize};
use telemetry::HealthReport;
use tracing::error;

/// `POST /api/session` success body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub success: bool,
    pub id: String,
    pub anonymous_id: String,
}

/// `POST /api/event` success body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsLogged {
    pub success: bool,
    pub events_processed: usize,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub success: bool,
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedIn {
    pub success: bool,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreated {
    pub success: bool,
    pub id: String,
    pub name: String,
    pub api_key: String,
}

/// Bare acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct Accepted {
    pub success: bool,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub database_connected: bool,
    pub summarizer_available: bool,
    #[serde(flatten)]
    pub report: HealthReport,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

/// API error with a status and a machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    /// Body was not valid JSON or had wrongly typed fields.
    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_002", msg)
    }

    pub fn too_large(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_003", msg)
    }

    pub fn route_not_found(path: &str) -> Self {
        Self::with_code(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("No route for {}", path),
        )
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_001"),
            retry_after,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = err.error_code();

        let message = match &err {
            Error::Auth { message, .. } | Error::Validation { message, .. } => message.clone(),
            // Store and serializer details stay in the logs.
            Error::Database { .. } => {
                error!(error = %err, "Database failure");
                "Database operation failed".to_string()
            }
            Error::Summarizer(_) | Error::Serialization(_) => {
                error!(error = %err, "Internal failure");
                "Internal server error".to_string()
            }
            Error::Internal(msg) => {
                error!(error = %err, "Internal failure");
                msg.clone()
            }
            Error::RateLimited(msg) => return ApiError::rate_limited(msg.clone(), Some(1)),
            Error::NotFound { .. } | Error::Conflict(_) => err.to_string(),
        };

        ApiError::with_code(status, code, message)
    }
}
