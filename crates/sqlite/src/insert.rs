//! Insert helpers.

use crate::client::{encode_time, write_error, write_error_or_conflict, SqliteStore};
use collector_core::error::DbErrorCode;
use collector_core::{Error, Event, Project, Report, Result, Session, User};
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

/// Map a foreign key violation to a missing parent, everything else via `write_error`.
fn missing_parent(resource: &'static str, id: String) -> impl Fn(sqlx::Error) -> Error {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Error::not_found(resource, id.clone())
        }
        _ => write_error("insert failed")(e),
    }
}

pub async fn insert_user(store: &SqliteStore, user: &User) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(encode_time(&user.created_at))
    .bind(encode_time(&user.updated_at))
    .execute(store.pool())
    .await
    .map_err(write_error_or_conflict("user", "email already registered"))?;

    debug!(user_id = %user.id, "Inserted user");
    Ok(())
}

/// Unknown owner is NotFound.
pub async fn insert_project(store: &SqliteStore, project: &Project) -> Result<()> {
    sqlx::query(
        "INSERT INTO projects (id, name, owner_id, api_key, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&project.id)
    .bind(&project.name)
    .bind(&project.owner_id)
    .bind(&project.api_key)
    .bind(encode_time(&project.created_at))
    .bind(encode_time(&project.updated_at))
    .execute(store.pool())
    .await
    .map_err(missing_parent("user", project.owner_id.clone()))?;

    debug!(project_id = %project.id, owner_id = %project.owner_id, "Inserted project");
    Ok(())
}

/// Unknown project is NotFound.
pub async fn insert_session(store: &SqliteStore, session: &Session) -> Result<()> {
    let metadata = serde_json::to_string(&session.metadata)?;

    sqlx::query(
        "INSERT INTO sessions \
         (id, project_id, anonymous_id, user_id, metadata, device, browser, os, started_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(&session.project_id)
    .bind(&session.anonymous_id)
    .bind(&session.user_id)
    .bind(metadata)
    .bind(&session.device.device)
    .bind(&session.device.browser)
    .bind(&session.device.os)
    .bind(encode_time(&session.started_at))
    .execute(store.pool())
    .await
    .map_err(missing_parent(
        "project",
        session.project_id.clone().unwrap_or_default(),
    ))?;

    debug!(session_id = %session.id, "Inserted session");
    Ok(())
}

/// Insert a batch of events in one transaction.
///
/// Either every row is written or none are. Returns the number of rows inserted.
pub async fn insert_events(store: &SqliteStore, events: &[Event]) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    let start = Instant::now();
    let mut tx = store
        .pool()
        .begin()
        .await
        .map_err(write_error("begin event batch"))?;

    let mut inserted = 0usize;
    for event in events {
        let properties = serde_json::to_string(&event.properties)?;
        let result = sqlx::query(
            "INSERT INTO events \
             (id, session_id, type, element_id, x, y, scroll_offset, properties, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(&event.session_id)
        .bind(&event.event_type)
        .bind(&event.element_id)
        .bind(event.x)
        .bind(event.y)
        .bind(event.scroll_offset)
        .bind(properties)
        .bind(encode_time(&event.created_at))
        .execute(&mut *tx)
        .await
        .map_err(missing_parent("session", event.session_id.clone()))?;

        inserted += result.rows_affected() as usize;
    }

    tx.commit().await.map_err(|e| {
        Error::database(
            DbErrorCode::StoreFailed,
            format!("commit event batch: {}", e),
        )
    })?;

    let elapsed = start.elapsed();
    metrics().ingest_latency_ms.observe(elapsed.as_millis() as u64);
    metrics().events_inserted.inc_by(inserted as u64);

    debug!(
        events = inserted,
        elapsed_ms = elapsed.as_millis(),
        "Inserted event batch"
    );
    Ok(inserted)
}

pub async fn insert_report(store: &SqliteStore, report: &Report) -> Result<()> {
    let data = report.data.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query("INSERT INTO reports (id, data, created_at) VALUES (?, ?, ?)")
        .bind(&report.id)
        .bind(data)
        .bind(encode_time(&report.created_at))
        .execute(store.pool())
        .await
        .map_err(write_error("report"))?;

    debug!(report_id = %report.id, "Inserted report");
    Ok(())
}
