//! Latest report.

use axum::{extract::State, http::StatusCode, Json};
use collector_core::Report;
use telemetry::metrics;
use worker::ReportOutcome;

use crate::response::ApiError;
use crate::state::AppState;

/// GET /api/report and GET /report
///
/// 201 when this call produced the first report, 200 otherwise. Only this
/// path counts cache hits; background refreshes do not.
pub async fn latest_report(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let (report, outcome) = state.reports.latest().await?;

    let status = match outcome {
        ReportOutcome::Created => StatusCode::CREATED,
        ReportOutcome::Regenerated => StatusCode::OK,
        ReportOutcome::Cached => {
            metrics().reports_served_cached.inc();
            StatusCode::OK
        }
    };
    Ok((status, Json(report)))
}
