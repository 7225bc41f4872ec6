//! Query functions for reading data back.

use crate::client::{decode_time, read_error, SqliteStore};
use collector_core::{DeviceInfo, Event, Project, Report, Result, Session, SessionWithEvents, User};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Session row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: String,
    pub project_id: Option<String>,
    pub anonymous_id: String,
    pub user_id: Option<String>,
    pub metadata: String,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub started_at: String,
}

impl SessionRow {
    pub fn into_session(self) -> Result<Session> {
        Ok(Session {
            id: self.id,
            project_id: self.project_id,
            anonymous_id: self.anonymous_id,
            user_id: self.user_id,
            metadata: serde_json::from_str(&self.metadata)?,
            device: DeviceInfo {
                device: self.device,
                browser: self.browser,
                os: self.os,
            },
            started_at: decode_time(&self.started_at)?,
        })
    }
}

/// Event row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: String,
    pub session_id: String,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub element_id: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scroll_offset: Option<f64>,
    pub properties: String,
    pub created_at: String,
}

impl EventRow {
    pub fn into_event(self) -> Result<Event> {
        let properties: Map<String, Value> = serde_json::from_str(&self.properties)?;
        Ok(Event {
            id: self.id,
            session_id: self.session_id,
            event_type: self.event_type,
            element_id: self.element_id,
            x: self.x,
            y: self.y,
            scroll_offset: self.scroll_offset,
            properties,
            created_at: decode_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReportRow {
    id: String,
    data: Option<String>,
    created_at: String,
}

impl ReportRow {
    fn into_report(self) -> Result<Report> {
        let data = match self.data {
            Some(raw) => Some(serde_json::from_str::<Value>(&raw)?).filter(|v| !v.is_null()),
            None => None,
        };
        Ok(Report {
            id: self.id,
            data,
            created_at: decode_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: Option<String>,
    password_hash: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProjectRow {
    id: String,
    name: String,
    owner_id: String,
    api_key: String,
    created_at: String,
    updated_at: String,
}

const SESSION_COLUMNS: &str =
    "id, project_id, anonymous_id, user_id, metadata, device, browser, os, started_at";
const EVENT_COLUMNS: &str =
    "id, session_id, type, element_id, x, y, scroll_offset, properties, created_at";

/// Fetch one session by id.
pub async fn find_session(store: &SqliteStore, session_id: &str) -> Result<Option<Session>> {
    let sql = format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS);
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(session_id)
        .fetch_optional(store.pool())
        .await
        .map_err(read_error("find session"))?;
    row.map(SessionRow::into_session).transpose()
}

pub async fn session_exists(store: &SqliteStore, session_id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM sessions WHERE id = ?")
        .bind(session_id)
        .fetch_optional(store.pool())
        .await
        .map_err(read_error("session exists"))?;
    Ok(found.is_some())
}

/// Load every session with all of its events.
///
/// Sessions come back in start order; events keep insertion order within a session.
/// Unpaginated: the whole table is read.
pub async fn load_sessions_with_events(store: &SqliteStore) -> Result<Vec<SessionWithEvents>> {
    let sql = format!(
        "SELECT {} FROM sessions ORDER BY started_at ASC, rowid ASC",
        SESSION_COLUMNS
    );
    let session_rows: Vec<SessionRow> = sqlx::query_as(&sql)
        .fetch_all(store.pool())
        .await
        .map_err(read_error("load sessions"))?;

    let sql = format!("SELECT {} FROM events ORDER BY rowid ASC", EVENT_COLUMNS);
    let event_rows: Vec<EventRow> = sqlx::query_as(&sql)
        .fetch_all(store.pool())
        .await
        .map_err(read_error("load events"))?;

    let mut by_session: HashMap<String, Vec<Event>> = HashMap::new();
    for row in event_rows {
        let event = row.into_event()?;
        by_session
            .entry(event.session_id.clone())
            .or_default()
            .push(event);
    }

    session_rows
        .into_iter()
        .map(|row| {
            let session = row.into_session()?;
            let events = by_session.remove(&session.id).unwrap_or_default();
            Ok(SessionWithEvents { session, events })
        })
        .collect()
}

/// Events for one session, in insertion order.
pub async fn events_for_session(store: &SqliteStore, session_id: &str) -> Result<Vec<Event>> {
    let sql = format!(
        "SELECT {} FROM events WHERE session_id = ? ORDER BY rowid ASC",
        EVENT_COLUMNS
    );
    let rows: Vec<EventRow> = sqlx::query_as(&sql)
        .bind(session_id)
        .fetch_all(store.pool())
        .await
        .map_err(read_error("events for session"))?;
    rows.into_iter().map(EventRow::into_event).collect()
}

pub async fn count_events_for_session(store: &SqliteStore, session_id: &str) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(store.pool())
        .await
        .map_err(read_error("count events"))?;
    Ok(count as u64)
}

/// The most recently created report. Ties go to the later insert.
pub async fn latest_report(store: &SqliteStore) -> Result<Option<Report>> {
    let row: Option<ReportRow> = sqlx::query_as(
        "SELECT id, data, created_at FROM reports ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .fetch_optional(store.pool())
    .await
    .map_err(read_error("latest report"))?;
    row.map(ReportRow::into_report).transpose()
}

pub async fn count_reports(store: &SqliteStore) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(store.pool())
        .await
        .map_err(read_error("count reports"))?;
    Ok(count as u64)
}

pub async fn find_user_by_email(store: &SqliteStore, email: &str) -> Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, email, name, password_hash, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(store.pool())
    .await
    .map_err(read_error("find user"))?;

    row.map(|r| {
        Ok(User {
            id: r.id,
            email: r.email,
            name: r.name,
            password_hash: r.password_hash,
            created_at: decode_time(&r.created_at)?,
            updated_at: decode_time(&r.updated_at)?,
        })
    })
    .transpose()
}

pub async fn find_project_by_api_key(store: &SqliteStore, api_key: &str) -> Result<Option<Project>> {
    let row: Option<ProjectRow> = sqlx::query_as(
        "SELECT id, name, owner_id, api_key, created_at, updated_at FROM projects WHERE api_key = ?",
    )
    .bind(api_key)
    .fetch_optional(store.pool())
    .await
    .map_err(read_error("find project"))?;

    row.map(|r| {
        Ok(Project {
            id: r.id,
            name: r.name,
            owner_id: r.owner_id,
            api_key: r.api_key,
            created_at: decode_time(&r.created_at)?,
            updated_at: decode_time(&r.updated_at)?,
        })
    })
    .transpose()
}
