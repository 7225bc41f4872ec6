//! Users, login and projects.

use axum::{extract::State, http::StatusCode, Json};
use collector_core::error::AuthErrorCode;
use collector_core::{verify_password, CreateProjectRequest, CreateUserRequest, Error, LoginRequest};
use sqlite_store::{find_user_by_email, insert_project, insert_user};
use tracing::{info, warn};

use crate::extractors::JsonBody;
use crate::response::{ApiError, LoggedIn, ProjectCreated, UserCreated};
use crate::state::AppState;

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserCreated>), ApiError> {
    let user = request.into_user()?;
    insert_user(&state.store, &user).await?;

    info!(user_id = %user.id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            success: true,
            id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /api/login
///
/// Checks credentials only; no token is issued.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoggedIn>, ApiError> {
    let (email, password) = request.credentials()?;

    let user = find_user_by_email(&state.store, &email)
        .await?
        .filter(|user| verify_password(&password, &user.password_hash))
        .ok_or_else(|| {
            warn!("Failed login attempt");
            Error::auth(AuthErrorCode::InvalidCredentials, "Invalid email or password")
        })?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoggedIn {
        success: true,
        user_id: user.id,
    }))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectCreated>), ApiError> {
    let project = request.into_project()?;
    insert_project(&state.store, &project).await?;

    info!(project_id = %project.id, owner_id = %project.owner_id, "Project created");
    Ok((
        StatusCode::CREATED,
        Json(ProjectCreated {
            success: true,
            id: project.id,
            name: project.name,
            api_key: project.api_key,
        }),
    ))
}
