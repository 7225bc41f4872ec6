//! Session types and the `createSession` request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::account::required;
use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::MAX_METADATA_BYTES;
use crate::validate_request;

/// Placeholder for device fields that could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Device/browser/OS description of the client behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device: String,
    pub browser: String,
    pub os: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

/// One client visit. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Set when the session was created with a project API key
    pub project_id: Option<String>,
    pub anonymous_id: String,
    /// Client-supplied user identifier (not a foreign key)
    pub user_id: Option<String>,
    /// Opaque client metadata, stored verbatim
    pub metadata: Value,
    #[serde(flatten)]
    pub device: DeviceInfo,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session with a generated id.
    pub fn new(anonymous_id: impl Into<String>, metadata: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: None,
            anonymous_id: anonymous_id.into(),
            user_id: None,
            metadata,
            device: DeviceInfo::default(),
            started_at: crate::now(),
        }
    }

    pub fn with_project(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Look up a string field in the metadata object.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// `POST /api/session` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[validate(length(max = 128))]
    pub anonymous_id: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[validate(length(max = 128))]
    pub user_id: Option<String>,
}

impl CreateSessionRequest {
    /// Validate the request and build an unsaved session.
    ///
    /// Device fields and project scoping are filled in by the caller.
    pub fn into_session(self) -> Result<Session> {
        let anonymous_id = required(self.anonymous_id.clone(), "anonymousId")?;
        validate_request(&self)?;

        if !self.metadata.is_null() {
            let size = serde_json::to_vec(&self.metadata)?.len();
            if size > MAX_METADATA_BYTES {
                return Err(Error::validation(
                    ValidationErrorCode::TooLarge,
                    format!(
                        "metadata {}KB exceeds {}KB limit",
                        size / 1024,
                        MAX_METADATA_BYTES / 1024
                    ),
                ));
            }
        }

        Ok(Session::new(anonymous_id, self.metadata).with_user(self.user_id))
    }
}
