//! Report records, aggregation, and the freshness policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::events::Event;
use crate::session::Session;

/// Default maximum report age before regeneration (minutes).
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 5;

/// A persisted point-in-time report.
///
/// `data` is null when summarization was attempted and produced nothing usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(data: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            created_at: crate::now(),
        }
    }

    /// Age of the report relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// A session loaded together with its events, in insertion order.
#[derive(Debug, Clone)]
pub struct SessionWithEvents {
    pub session: Session,
    pub events: Vec<Event>,
}

/// Per-session slice of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: String,
    pub metadata: Value,
    pub events: Vec<Event>,
    pub total_events: u64,
    pub events_by_type: BTreeMap<String, u64>,
}

impl SessionReport {
    pub fn from_session(entry: SessionWithEvents) -> Self {
        Self {
            session_id: entry.session.id,
            metadata: entry.session.metadata,
            total_events: entry.events.len() as u64,
            events_by_type: count_by_type(&entry.events),
            events: entry.events,
        }
    }
}

/// Aggregate usage across every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAggregate {
    pub total_sessions: u64,
    pub total_events: u64,
    pub sessions: Vec<SessionReport>,
}

impl ReportAggregate {
    /// Build the aggregate from fully loaded sessions.
    pub fn build(sessions: Vec<SessionWithEvents>) -> Self {
        let sessions: Vec<SessionReport> =
            sessions.into_iter().map(SessionReport::from_session).collect();

        Self {
            total_sessions: sessions.len() as u64,
            total_events: sessions.iter().map(|s| s.total_events).sum(),
            sessions,
        }
    }
}

/// Count occurrences of each event type tag.
pub fn count_by_type(events: &[Event]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.event_type.clone()).or_insert(0) += 1;
    }
    counts
}

/// Decides when a cached report is too old to serve.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    threshold: Duration,
}

impl FreshnessPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Threshold in whole minutes. Negative values mean zero; values beyond
    /// the representable duration range are rejected.
    pub fn from_minutes(minutes: i64) -> Result<Self> {
        Duration::try_minutes(minutes.max(0))
            .map(Self::new)
            .ok_or_else(|| {
                Error::validation(
                    ValidationErrorCode::TooLarge,
                    format!("freshness of {} minutes is out of range", minutes),
                )
            })
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// A report is stale once its age strictly exceeds the threshold.
    pub fn is_stale(&self, report: &Report, now: DateTime<Utc>) -> bool {
        report.age(now) > self.threshold
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_FRESHNESS_MINUTES))
    }
}
