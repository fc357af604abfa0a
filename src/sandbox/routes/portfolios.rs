//! Portfolio Routes
//!
//! - GET /api/portfolios - List portfolios
//! - GET /api/anomalies/:portfolio_id - Flagged fees of a portfolio
//! - POST /api/detect-anomalies/:portfolio_id - Rescore a portfolio's fees

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::models::{Anomaly, DetectionSummary, Portfolio};
use crate::sandbox::auth::Viewer;
use crate::sandbox::detection::score_fees;
use crate::sandbox::error::{ApiError, ApiResult};
use crate::sandbox::state::{AnomalyRecord, SandboxState};

/// GET /api/portfolios
pub async fn list_portfolios(
    State(state): State<Arc<SandboxState>>,
    _viewer: Viewer,
) -> Json<Vec<Portfolio>> {
    let ledger = state.ledger.read().await;
    Json(ledger.portfolios.clone())
}

/// GET /api/anomalies/:portfolio_id
///
/// Unknown portfolios yield an empty list.
pub async fn list_anomalies(
    State(state): State<Arc<SandboxState>>,
    _viewer: Viewer,
    Path(portfolio_id): Path<i64>,
) -> Json<Vec<Anomaly>> {
    let ledger = state.ledger.read().await;
    Json(ledger.anomalies_for(portfolio_id))
}

/// POST /api/detect-anomalies/:portfolio_id
///
/// Replaces the portfolio's earlier anomalies with a fresh scoring pass.
pub async fn detect_anomalies(
    State(state): State<Arc<SandboxState>>,
    _viewer: Viewer,
    Path(portfolio_id): Path<i64>,
) -> ApiResult<Json<DetectionSummary>> {
    let threshold = state.config.z_threshold;
    let mut ledger = state.ledger.write().await;

    if ledger.portfolio(portfolio_id).is_none() {
        return Err(ApiError::NotFound("Portfolio not found".to_string()));
    }

    let fees = ledger.fees_for(portfolio_id);
    let flagged = score_fees(&fees, threshold);

    ledger.anomalies.retain(|a| a.portfolio_id != portfolio_id);

    let detected_at = Utc::now();
    for hit in &flagged {
        let id = ledger.next_anomaly_id();
        ledger.anomalies.push(AnomalyRecord {
            id,
            portfolio_id,
            fee_id: hit.fee_id,
            score: hit.score,
            detected_at,
        });
    }

    tracing::info!(
        portfolio_id,
        fees = fees.len(),
        anomalies = flagged.len(),
        "Detection finished"
    );

    Ok(Json(DetectionSummary {
        message: format!(
            "Detected {} anomalies for Portfolio {}",
            flagged.len(),
            portfolio_id
        ),
        anomalies_found: flagged.len(),
        total_processed: fees.len(),
        detection_sensitivity: threshold,
    }))
}
