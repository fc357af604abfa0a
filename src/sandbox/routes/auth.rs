//! Auth Routes
//!
//! - POST /api/auth/register - Create an account
//! - POST /api/auth/login - Exchange credentials for a bearer token
//! - GET /api/auth/me - Profile of the token's owner

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::models::{LoginResponse, RegisterResponse, User};
use crate::sandbox::auth::AuthUser;
use crate::sandbox::dto::{present, LoginPayload, RegisterPayload};
use crate::sandbox::error::{ApiError, ApiResult};
use crate::sandbox::state::{Account, SandboxState};

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<SandboxState>>,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    // Passwords are stored as typed; only names and email are trimmed
    let (Some(first_name), Some(last_name), Some(email), Some(password)) = (
        present(payload.first_name),
        present(payload.last_name),
        present(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    };

    let mut ledger = state.ledger.write().await;

    if ledger
        .accounts
        .iter()
        .any(|a| a.user.email.eq_ignore_ascii_case(&email))
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let id = ledger.next_user_id();
    ledger.accounts.push(Account {
        user: User {
            id,
            first_name,
            last_name,
            email: email.clone(),
        },
        password,
    });

    tracing::info!(user_id = id, %email, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user_id: Some(id),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<SandboxState>>,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (
        present(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation("Email and password required".to_string()));
    };

    let mut ledger = state.ledger.write().await;

    let user = ledger
        .accounts
        .iter()
        .find(|a| a.user.email.eq_ignore_ascii_case(&email) && a.password == password)
        .map(|a| a.user.clone())
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // One live token per user; signing in again revokes the previous one
    ledger.tokens.retain(|_, owner| *owner != user.id);
    let token = uuid::Uuid::new_v4().simple().to_string();
    ledger.tokens.insert(token.clone(), user.id);

    tracing::info!(user_id = user.id, "Issued access token");

    Ok(Json(LoginResponse {
        access_token: token,
        user,
    }))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
