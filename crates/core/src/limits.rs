//! Size limits for ingestion requests.
//!
//! These bound the memory a single request can pin. The `#[validate]` derive
//! macro requires literal values in attributes, so field limits are duplicated
//! there. Keep both in sync when modifying.

// === Request Limits ===

/// Maximum request body size in bytes (1MB).
pub const MAX_BODY_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum events per `logEvent` batch.
pub const MAX_BATCH_EVENTS: usize = 1000;

// === Session Limits ===

/// Anonymous client identifier max length (chars).
pub const MAX_ANONYMOUS_ID_LEN: usize = 128;

/// Client-supplied user identifier max length (chars).
pub const MAX_USER_ID_LEN: usize = 128;

/// Serialized session metadata max size in bytes (16KB).
pub const MAX_METADATA_BYTES: usize = 16 * 1024;

/// User agent string max length before parsing.
pub const MAX_USER_AGENT_LEN: usize = 512;

// === Event Limits ===

/// Event type tag max length.
pub const MAX_EVENT_TYPE_LEN: usize = 64;

/// Element identifier max length.
pub const MAX_ELEMENT_ID_LEN: usize = 256;

// === Account Limits ===

/// Email max length.
pub const MAX_EMAIL_LEN: usize = 254;

/// Project name max length.
pub const MAX_PROJECT_NAME_LEN: usize = 200;

/// API key pattern: `ak_(live|test)_` followed by 32 alphanumerics.
pub const API_KEY_PATTERN: &str = r"^ak_(live|test)_[a-zA-Z0-9]{32}$";
