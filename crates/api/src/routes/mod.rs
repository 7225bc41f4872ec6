//! API routes.

pub mod account;
pub mod client_error;
pub mod event;
pub mod health;
pub mod report;
pub mod session;

use axum::{
    http::Uri,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{panic::handle_panic, rate_limit::rate_limit};
use crate::response::ApiError;
use crate::state::AppState;

/// Creates the API router.
///
/// Client-facing `/api` routes and `/report` are rate limited; health probes are not.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limited = Router::new()
        .route("/api/session", post(session::create_session))
        .route("/api/event", post(event::log_event))
        .route("/api/report", get(report::latest_report))
        .route("/report", get(report::latest_report))
        .route("/api/error", post(client_error::report_client_error))
        .route("/api/users", post(account::create_user))
        .route("/api/login", post(account::login))
        .route("/api/projects", post(account::create_project))
        .route_layer(from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(limited)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}
