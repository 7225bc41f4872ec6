//! Event batch ingestion.

use axum::{extract::State, http::StatusCode, Json};
use collector_core::{is_known_event_type, parse_event_batch, Error, LogEventRequest};
use sqlite_store::{insert_events, session_exists};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::extractors::JsonBody;
use crate::response::{ApiError, EventsLogged};
use crate::state::AppState;

/// POST /api/event
///
/// All-or-nothing: the session must exist, every event must parse, and the
/// rows are written in one transaction.
pub async fn log_event(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LogEventRequest>,
) -> Result<(StatusCode, Json<EventsLogged>), ApiError> {
    let start = Instant::now();

    let (session_id, raw) = request.validate()?;
    metrics().events_received.inc_by(raw.len() as u64);

    if !session_exists(&state.store, &session_id).await? {
        debug!(session_id = %session_id, "Events for unknown session");
        return Err(Error::not_found("session", session_id).into());
    }

    let events = parse_event_batch(&session_id, raw).map_err(|e| {
        metrics().event_batches_failed.inc();
        warn!(session_id = %session_id, error = %e, "Rejected event batch");
        e
    })?;

    let unrecognized = events
        .iter()
        .filter(|e| !is_known_event_type(&e.event_type))
        .count();
    if unrecognized > 0 {
        debug!(session_id = %session_id, unrecognized, "Batch contains custom event types");
    }

    let inserted = insert_events(&state.store, &events).await.map_err(|e| {
        metrics().event_batches_failed.inc();
        e
    })?;

    info!(
        session_id = %session_id,
        events = inserted,
        latency_ms = start.elapsed().as_millis() as u64,
        "Events logged"
    );

    Ok((
        StatusCode::CREATED,
        Json(EventsLogged {
            success: true,
            events_processed: inserted,
            session_id,
        }),
    ))
}
