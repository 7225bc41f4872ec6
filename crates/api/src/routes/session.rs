//! Session creation.

use axum::{extract::State, http::StatusCode, Json};
use collector_core::CreateSessionRequest;
use sqlite_store::insert_session;
use telemetry::metrics;
use tracing::info;

use crate::extractors::{JsonBody, ProjectScope, UserAgent};
use crate::response::{ApiError, SessionCreated};
use crate::state::AppState;

/// POST /api/session
///
/// Stores a new session with its metadata verbatim. An API key scopes the
/// session to a project; device fields come from the user agent.
pub async fn create_session(
    State(state): State<AppState>,
    ProjectScope(project_id): ProjectScope,
    UserAgent(user_agent): UserAgent,
    JsonBody(request): JsonBody<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let mut session = request.into_session()?.with_project(project_id);
    state.enricher.enrich(&mut session, user_agent.as_deref());

    insert_session(&state.store, &session).await?;
    metrics().sessions_created.inc();

    info!(
        session_id = %session.id,
        project_id = ?session.project_id,
        device = %session.device.device,
        browser = %session.device.browser,
        "Session created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            success: true,
            id: session.id,
            anonymous_id: session.anonymous_id,
        }),
    ))
}
