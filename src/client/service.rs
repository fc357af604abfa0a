//! Service traits consumed by the view controllers
//!
//! [`ApiClient`](super::ApiClient) implements all three; controllers are
//! generic so they can be driven by in-process fakes.

use async_trait::async_trait;

use super::ClientResult;
use crate::models::{
    Anomaly, DetectionSummary, ExtractionResponse, LoginRequest, Portfolio, RegisterRequest,
    RegisterResponse, Session,
};

/// Sign-in and account creation
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a session; the session is stored on success
    async fn login(&self, credentials: &LoginRequest) -> ClientResult<Session>;

    /// Create an account; does not sign in
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse>;
}

/// Portfolio and anomaly reads plus the remote detection trigger
#[async_trait]
pub trait PortfolioService: Send + Sync {
    async fn portfolios(&self) -> ClientResult<Vec<Portfolio>>;

    async fn anomalies(&self, portfolio_id: i64) -> ClientResult<Vec<Anomaly>>;

    /// Ask the server to rescore the portfolio's fees
    async fn detect_anomalies(&self, portfolio_id: i64) -> ClientResult<DetectionSummary>;
}

/// OCR extraction of statement PDFs
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// POST the file as multipart field `file` to `endpoint`
    async fn upload_pdf(
        &self,
        endpoint: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<ExtractionResponse>;
}
