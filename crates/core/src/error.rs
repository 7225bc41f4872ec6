//! Unified error types for the analytics collector.
//!
//! Error codes:
//! - AUTH_001-004: Authentication errors
//! - VALID_001-003: Validation errors
//! - NOT_FOUND / CONFLICT: Missing or duplicate records
//! - DB_001-002: Database errors
//! - RATE_001: Rate limit errors
//! - INTERNAL: Everything else that maps to a 500

use thiserror::Error;
use validator::Validate;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// AUTH_001: API key is required
    MissingKey,
    /// AUTH_002: Invalid API key format
    InvalidFormat,
    /// AUTH_003: Invalid API key (no project owns it)
    InvalidKey,
    /// AUTH_004: Email/password pair did not match a user
    InvalidCredentials,
}

impl AuthErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingKey => "AUTH_001",
            Self::InvalidFormat => "AUTH_002",
            Self::InvalidKey => "AUTH_003",
            Self::InvalidCredentials => "AUTH_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        401
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: A required field is missing or empty
    MissingField,
    /// VALID_002: Invalid JSON / invalid format
    InvalidFormat,
    /// VALID_003: Batch, body, or field exceeds its limit
    TooLarge,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField => "VALID_001",
            Self::InvalidFormat => "VALID_002",
            Self::TooLarge => "VALID_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Database error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Failed to store rows
    StoreFailed,
    /// DB_002: Failed to read rows
    QueryFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "DB_001",
            Self::QueryFailed => "DB_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Unified error type for the analytics collector.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication error with code.
    #[error("[{code}] {message}")]
    Auth {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Validation error with code.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Database error with code.
    #[error("[{code}] {message}")]
    Database {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// A referenced record does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// A unique constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("summarizer error: {0}")]
    Summarizer(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an authentication error.
    pub fn auth(code: AuthErrorCode, msg: impl Into<String>) -> Self {
        Self::Auth {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a validation error with code.
    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Shorthand for a missing required field.
    pub fn missing_field(field: &str) -> Self {
        Self::validation(
            ValidationErrorCode::MissingField,
            format!("{} is required", field),
        )
    }

    /// Create a database error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn summarizer(msg: impl Into<String>) -> Self {
        Self::Summarizer(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth { http_status, .. } => *http_status,
            Self::Validation { http_status, .. } => *http_status,
            Self::Database { http_status, .. } => *http_status,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::RateLimited(_) => 429,
            Self::Summarizer(_) => 500,
            Self::Serialization(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth { code, .. } => code,
            Self::Validation { code, .. } => code,
            Self::Database { code, .. } => code,
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited(_) => "RATE_001",
            Self::Summarizer(_) | Self::Serialization(_) | Self::Internal(_) => "INTERNAL",
        }
    }
}

/// Run `validator` rules on a request body.
///
/// Field limits in this crate are all upper bounds, so any failure is
/// reported as `VALID_003`.
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|errors| {
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        Error::validation(
            ValidationErrorCode::TooLarge,
            format!("field exceeds its limit: {}", fields.join(", ")),
        )
    })
}
