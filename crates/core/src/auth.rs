//! Project API keys and password hashing.
//!
//! This module provides:
//! - API key format validation and generation (ak_live/test_xxx)
//! - Argon2id password hashes (PHC strings) for the login record lookup

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::error::{AuthErrorCode, Error, Result};
use crate::limits::API_KEY_PATTERN;

/// Compiled API key regex (lazy initialization).
static API_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(API_KEY_PATTERN).expect("invalid API key pattern"));

/// API key environment: live or test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyEnv {
    Live,
    Test,
}

impl ApiKeyEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
        }
    }
}

/// Parsed and validated API key from a request.
#[derive(Debug, Clone)]
pub struct ParsedApiKey {
    raw: String,
    env: ApiKeyEnv,
}

impl ParsedApiKey {
    /// Parse and validate an API key.
    ///
    /// Format: `ak_(live|test)_[a-zA-Z0-9]{32}`
    pub fn parse(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::auth(AuthErrorCode::MissingKey, "API key is required"));
        }

        if !API_KEY_REGEX.is_match(key) {
            return Err(Error::auth(
                AuthErrorCode::InvalidFormat,
                "Invalid API key format",
            ));
        }

        let env = if key.starts_with("ak_live_") {
            ApiKeyEnv::Live
        } else {
            ApiKeyEnv::Test
        };

        Ok(Self {
            raw: key.to_string(),
            env,
        })
    }

    /// Get the raw key string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn env(&self) -> ApiKeyEnv {
        self.env
    }
}

/// Generate a fresh project API key.
pub fn generate_api_key(env: ApiKeyEnv) -> String {
    format!("ak_{}_{}", env.as_str(), Uuid::new_v4().simple())
}

/// Extract an optional API key from request headers.
///
/// Checks in order:
/// 1. `Authorization: Bearer <key>`
/// 2. `X-API-Key: <key>`
///
/// Returns `Ok(None)` when neither header is present; a present but
/// malformed key is an error.
pub fn extract_api_key(
    auth_header: Option<&str>,
    api_key_header: Option<&str>,
) -> Result<Option<ParsedApiKey>> {
    if let Some(auth) = auth_header {
        if let Some(key) = auth.strip_prefix("Bearer ") {
            return ParsedApiKey::parse(key.trim()).map(Some);
        }
    }

    if let Some(key) = api_key_header {
        return ParsedApiKey::parse(key.trim()).map(Some);
    }

    Ok(None)
}

/// Hash a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string.
///
/// Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}
