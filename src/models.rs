//! Domain Types
//!
//! Read-only projections served by the asset-management API, plus the
//! request and response bodies of the auth and upload endpoints.
//! Field names match the JSON the service emits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// ACCOUNT
// ============================================

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// "First Last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Client-held proof of authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/login body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: response.access_token,
            user: response.user,
        }
    }
}

/// POST /api/auth/register body
///
/// The confirmation password is checked client-side and never sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/auth/register response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Error body shape shared by the API routes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Prefer `message`, then `error`
    pub fn describe(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

// ============================================
// PORTFOLIOS & ANOMALIES
// ============================================

/// A named collection of managed assets with an assigned manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
    pub manager: String,
    pub total_assets: f64,
}

/// A flagged deviation in a fee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: i64,
    #[serde(default)]
    pub fee_id: Option<i64>,
    pub anomaly_score: f64,
    #[serde(default)]
    pub detected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_date: Option<String>,
}

/// POST /api/detect-anomalies/:id response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub message: String,
    pub anomalies_found: usize,
    pub total_processed: usize,
    pub detection_sensitivity: f64,
}

// ============================================
// PDF EXTRACTION
// ============================================

/// Amounts extracted from a statement PDF
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl ExtractedFields {
    /// Field names in display order
    pub const FIELDS: [&'static str; 6] =
        ["rent", "management_fee", "repair", "deposit", "misc", "total"];

    pub fn get(&self, field: &str) -> Option<f64> {
        match field {
            "rent" => self.rent,
            "management_fee" => self.management_fee,
            "repair" => self.repair,
            "deposit" => self.deposit,
            "misc" => self.misc,
            "total" => self.total,
            _ => None,
        }
    }

    pub fn set(&mut self, field: &str, value: f64) {
        match field {
            "rent" => self.rent = Some(value),
            "management_fee" => self.management_fee = Some(value),
            "repair" => self.repair = Some(value),
            "deposit" => self.deposit = Some(value),
            "misc" => self.misc = Some(value),
            "total" => self.total = Some(value),
            _ => {}
        }
    }
}

/// POST /api/upload-pdf response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractedFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_confidences: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExtractionResponse {
    /// Failure shape shown to the user when the request never completed
    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}
