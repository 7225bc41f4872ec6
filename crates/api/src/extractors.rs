//! Request extractors.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
};
use collector_core::extract_api_key;
use collector_core::limits::MAX_BODY_SIZE_BYTES;
use serde::de::DeserializeOwned;

use crate::response::ApiError;
use crate::state::AppState;

/// JSON body parsed from raw bytes.
///
/// Unlike `axum::Json` this ignores the content type and reports bad input
/// in the standard error shape (`VALID_002` / `VALID_003`).
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::too_large(e.body_text()))?;
        parse_json(&body).map(JsonBody)
    }
}

/// Size-check then deserialize a request body.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.len() > MAX_BODY_SIZE_BYTES {
        return Err(ApiError::too_large(format!(
            "Payload size {}KB exceeds {}KB limit",
            body.len() / 1024,
            MAX_BODY_SIZE_BYTES / 1024
        )));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_body(format!("Invalid JSON body: {}", e)))
}

/// Project the request is scoped to, if it carried an API key.
///
/// No key is fine. A malformed key is `AUTH_002`, an unknown one `AUTH_003`.
#[derive(Debug, Clone)]
pub struct ProjectScope(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for ProjectScope {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let api_key_header = parts.headers.get("X-API-Key").and_then(|h| h.to_str().ok());

        let Some(api_key) = extract_api_key(auth_header, api_key_header)? else {
            return Ok(ProjectScope(None));
        };

        let project_id = state.projects.resolve(&api_key).await?;
        Ok(ProjectScope(Some(project_id)))
    }
}

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.headers)))
    }
}

/// First `X-Forwarded-For` hop, else `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("X-Forwarded-For").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = xff.split(',').next().map(str::trim).filter(|ip| !ip.is_empty()) {
            return Some(ip.to_string());
        }
    }

    headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(|ip| ip.trim().to_string())
}

/// The request's `User-Agent` header.
#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UserAgent(
            parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        ))
    }
}
