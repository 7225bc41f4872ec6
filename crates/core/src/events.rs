//! Event types and the `logEvent` batch request.
//!
//! Clients send loosely-typed event objects. A handful of fields are known
//! (`type`, `elementId`, `x`, `y`, `scrollOffset`); anything else is kept in
//! `properties`. Parsing is all-or-nothing: one malformed object rejects the
//! whole batch before anything is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::{MAX_BATCH_EVENTS, MAX_ELEMENT_ID_LEN, MAX_EVENT_TYPE_LEN};

/// Event type tags recommended for browser clients.
pub const RECOMMENDED_EVENT_TYPES: [&str; 5] = ["pageview", "click", "scroll", "hover", "navigate"];

/// Closed set of interaction kinds used by strictly-typed clients.
///
/// Stored tags are open strings; this enum only names the strict values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InteractionKind {
    Click,
    Scroll,
    Hover,
    Navigate,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 4] = [Self::Click, Self::Scroll, Self::Hover, Self::Navigate];

    /// Match a strict (uppercase) tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "CLICK",
            Self::Scroll => "SCROLL",
            Self::Hover => "HOVER",
            Self::Navigate => "NAVIGATE",
        }
    }
}

/// A stored interaction event. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub element_id: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scroll_offset: Option<f64>,
    /// Client fields outside the known set
    pub properties: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Client-side shape of one event object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventInput {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, alias = "element")]
    element_id: Option<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default, alias = "scrollY")]
    scroll_offset: Option<f64>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

/// Server-assigned keys a client cannot override through `properties`.
const RESERVED_KEYS: [&str; 3] = ["id", "sessionId", "createdAt"];

impl Event {
    /// Parse one client event object and stamp it with its owning session.
    pub fn from_client(session_id: &str, raw: Value, now: DateTime<Utc>) -> Result<Self> {
        let input: EventInput = serde_json::from_value(raw)?;

        let event_type = input.event_type.trim();
        if event_type.is_empty() {
            return Err(Error::internal("event type is empty"));
        }
        if event_type.len() > MAX_EVENT_TYPE_LEN {
            return Err(Error::internal(format!(
                "event type exceeds {} chars",
                MAX_EVENT_TYPE_LEN
            )));
        }
        if input
            .element_id
            .as_ref()
            .is_some_and(|e| e.len() > MAX_ELEMENT_ID_LEN)
        {
            return Err(Error::internal(format!(
                "elementId exceeds {} chars",
                MAX_ELEMENT_ID_LEN
            )));
        }

        let mut properties = input.properties;
        for key in RESERVED_KEYS {
            properties.remove(key);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            event_type: event_type.to_string(),
            element_id: input.element_id,
            x: input.x,
            y: input.y,
            scroll_offset: input.scroll_offset,
            properties,
            created_at: now,
        })
    }
}

/// `POST /api/event` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventRequest {
    pub session_id: Option<String>,
    pub events: Option<Vec<Value>>,
}

impl LogEventRequest {
    /// Check required fields and the batch limit.
    ///
    /// Returns the session id and the raw event objects; parsing the objects
    /// is deferred until the session is known to exist.
    pub fn validate(self) -> Result<(String, Vec<Value>)> {
        let session_id = match self.session_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(Error::missing_field("sessionId")),
        };
        let events = self.events.ok_or_else(|| Error::missing_field("events"))?;

        if events.len() > MAX_BATCH_EVENTS {
            return Err(Error::validation(
                ValidationErrorCode::TooLarge,
                format!(
                    "Batch has {} events, exceeds {} limit",
                    events.len(),
                    MAX_BATCH_EVENTS
                ),
            ));
        }

        Ok((session_id, events))
    }
}

/// Whether a tag is one of the recommended or strict event types.
///
/// Unknown tags are still stored; this only feeds diagnostics.
pub fn is_known_event_type(tag: &str) -> bool {
    RECOMMENDED_EVENT_TYPES.contains(&tag) || InteractionKind::from_tag(tag).is_some()
}

/// Parse a whole batch for one session.
///
/// Every event shares the same creation timestamp; order within the batch is
/// preserved. Any malformed object fails the batch as an internal error.
pub fn parse_event_batch(session_id: &str, raw: Vec<Value>) -> Result<Vec<Event>> {
    let now = crate::now();
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            Event::from_client(session_id, value, now)
                .map_err(|e| Error::internal(format!("event {} is malformed: {}", index, e)))
        })
        .collect()
}
