//! Panic catch-all.
//!
//! A panicking handler becomes a plain 500 in the standard error shape.
//! The panic message is logged, never returned.

use axum::response::{IntoResponse, Response};
use std::any::Any;
use tracing::error;

use crate::response::ApiError;

/// Handler for `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    error!(panic = %detail, "Request handler panicked");
    ApiError::internal("Internal server error").into_response()
}
