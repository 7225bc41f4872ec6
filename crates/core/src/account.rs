//! User and project records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{generate_api_key, hash_password, ApiKeyEnv};
use crate::error::{Error, Result, ValidationErrorCode};
use crate::validate_request;

/// A registered user. Owns projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user, hashing the plaintext password.
    pub fn new(email: impl Into<String>, name: Option<String>, password: &str) -> Result<Self> {
        let now = crate::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            name,
            password_hash: hash_password(password)?,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A project. Sessions created with its API key reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project with a freshly generated live API key.
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let now = crate::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id: owner_id.into(),
            api_key: generate_api_key(ApiKeyEnv::Live),
            created_at: now,
            updated_at: now,
        }
    }
}

/// `POST /api/users` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(max = 254))]
    pub email: Option<String>,
    pub password: Option<String>,
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

impl CreateUserRequest {
    /// Validate and build the user record.
    pub fn into_user(self) -> Result<User> {
        validate_request(&self)?;
        let email = required(self.email, "email")?;
        let password = required(self.password, "password")?;
        if !email.contains('@') {
            return Err(Error::validation(
                ValidationErrorCode::InvalidFormat,
                "email is not a valid address",
            ));
        }
        User::new(email.to_lowercase(), self.name, &password)
    }
}

/// `POST /api/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns `(email, password)` once both are present.
    pub fn credentials(self) -> Result<(String, String)> {
        let email = required(self.email, "email")?;
        let password = required(self.password, "password")?;
        Ok((email.to_lowercase(), password))
    }
}

/// `POST /api/projects` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub owner_id: Option<String>,
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

impl CreateProjectRequest {
    pub fn into_project(self) -> Result<Project> {
        validate_request(&self)?;
        let owner_id = required(self.owner_id, "ownerId")?;
        let name = required(self.name, "name")?;
        Ok(Project::new(name, owner_id))
    }
}

/// Unwrap a required string field, treating blank as missing.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::missing_field(field)),
    }
}
