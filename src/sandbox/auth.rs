//! Bearer token extractors

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use super::error::ApiError;
use super::state::SandboxState;
use crate::models::User;

/// Signed-in caller; rejects with 401 otherwise
pub struct AuthUser(pub User);

/// Caller on a route whose auth requirement follows `require_auth`
///
/// A presented token must always be valid; an absent one is only accepted
/// when the sandbox runs open.
pub struct Viewer(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn resolve(token: &str, state: &SandboxState) -> Result<User, ApiError> {
    state
        .ledger
        .read()
        .await
        .user_for_token(token)
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))
}

#[async_trait]
impl FromRequestParts<Arc<SandboxState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SandboxState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        Ok(AuthUser(resolve(token, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<Arc<SandboxState>> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SandboxState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(Viewer(Some(resolve(token, state).await?))),
            None if state.config.require_auth => {
                Err(ApiError::Unauthorized("Missing bearer token".to_string()))
            }
            None => Ok(Viewer(None)),
        }
    }
}
