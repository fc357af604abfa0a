//! Health Route
//!
//! - GET /health - Liveness plus a summary of the loaded data

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::sandbox::dto::HealthResponse;
use crate::sandbox::state::SandboxState;

/// GET /health
pub async fn health(State(state): State<Arc<SandboxState>>) -> Json<HealthResponse> {
    let portfolios = state.ledger.read().await.portfolios.len();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        portfolios,
    })
}
