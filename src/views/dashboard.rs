//! Portfolio / anomaly dashboard
//!
//! Holds what the dashboard shows: the portfolio list, the selection, the
//! selection's anomalies and an inline error. Every operation is a plain
//! request/await/update; nothing is cached between selections.

use crate::client::{ClientError, PortfolioService};
use crate::models::{Anomaly, DetectionSummary, Portfolio};

/// Dashboard controller
pub struct Dashboard<S> {
    service: S,
    portfolios: Vec<Portfolio>,
    selected: Option<Portfolio>,
    anomalies: Vec<Anomaly>,
    last_detection: Option<DetectionSummary>,
    detecting: bool,
    session_expired: bool,
    error: Option<String>,
}

impl<S: PortfolioService> Dashboard<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            portfolios: Vec::new(),
            selected: None,
            anomalies: Vec::new(),
            last_detection: None,
            detecting: false,
            session_expired: false,
            error: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    pub fn selected(&self) -> Option<&Portfolio> {
        self.selected.as_ref()
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn last_detection(&self) -> Option<&DetectionSummary> {
        self.last_detection.as_ref()
    }

    /// True while a detection request is in flight
    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    /// The server rejected the session; the caller must sign in again
    pub fn needs_login(&self) -> bool {
        self.session_expired
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the portfolio list; on failure the list is cleared
    pub async fn load_portfolios(&mut self) -> bool {
        self.error = None;

        match self.service.portfolios().await {
            Ok(portfolios) => {
                tracing::debug!(count = portfolios.len(), "Loaded portfolios");
                self.portfolios = portfolios;
                true
            }
            Err(e) => {
                self.portfolios.clear();
                self.fail("Error fetching portfolios", e);
                false
            }
        }
    }

    /// Select a portfolio and fetch its anomalies once
    pub async fn select(&mut self, portfolio_id: i64) -> bool {
        self.error = None;

        let Some(portfolio) = self.portfolios.iter().find(|p| p.id == portfolio_id).cloned()
        else {
            self.error = Some(format!("Unknown portfolio {}", portfolio_id));
            return false;
        };

        self.selected = Some(portfolio);
        self.anomalies.clear();
        self.last_detection = None;
        self.fetch_anomalies(portfolio_id).await
    }

    /// Run remote detection for the selection, then re-fetch its anomalies
    pub async fn run_detection(&mut self) -> bool {
        self.error = None;

        let Some(portfolio_id) = self.selected.as_ref().map(|p| p.id) else {
            self.error = Some("Select a portfolio first".to_string());
            return false;
        };

        self.detecting = true;
        let outcome = self.service.detect_anomalies(portfolio_id).await;

        let ok = match outcome {
            Ok(summary) => {
                tracing::info!(portfolio_id, "{}", summary.message);
                self.last_detection = Some(summary);
                self.fetch_anomalies(portfolio_id).await
            }
            Err(e) => {
                self.fail("Error running anomaly detection", e);
                false
            }
        };

        self.detecting = false;
        ok
    }

    async fn fetch_anomalies(&mut self, portfolio_id: i64) -> bool {
        match self.service.anomalies(portfolio_id).await {
            Ok(anomalies) => {
                tracing::debug!(portfolio_id, count = anomalies.len(), "Loaded anomalies");
                self.anomalies = anomalies;
                true
            }
            Err(e) => {
                self.anomalies.clear();
                self.fail("Error fetching anomalies", e);
                false
            }
        }
    }

    fn fail(&mut self, context: &str, e: ClientError) {
        tracing::error!("{}: {}", context, e);

        if e.is_unauthorized() {
            // Session is gone; drop everything fetched under it
            self.session_expired = true;
            self.portfolios.clear();
            self.selected = None;
            self.anomalies.clear();
            self.last_detection = None;
            self.error = Some("Session expired, please sign in again".to_string());
        } else {
            self.error = Some(format!("{}: {}", context, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<String>>,
        fail_anomalies: bool,
        expire_on_detect: bool,
    }

    impl FakeService {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl PortfolioService for FakeService {
        async fn portfolios(&self) -> ClientResult<Vec<Portfolio>> {
            self.log("GET /api/portfolios".to_string());
            Ok(vec![
                Portfolio {
                    id: 1,
                    name: "Tech Growth Fund".to_string(),
                    manager: "Alpha Investments".to_string(),
                    total_assets: 50_000_000.0,
                },
                Portfolio {
                    id: 2,
                    name: "Balanced Portfolio".to_string(),
                    manager: "Beta Capital".to_string(),
                    total_assets: 75_000_000.0,
                },
            ])
        }

        async fn anomalies(&self, portfolio_id: i64) -> ClientResult<Vec<Anomaly>> {
            self.log(format!("GET /api/anomalies/{}", portfolio_id));
            if self.fail_anomalies {
                return Err(ClientError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(vec![Anomaly {
                id: 10,
                fee_id: Some(3),
                anomaly_score: 3.2,
                detected_at: Some("2024-05-01T00:00:00Z".to_string()),
                fee_amount: None,
                fee_date: None,
            }])
        }

        async fn detect_anomalies(&self, portfolio_id: i64) -> ClientResult<DetectionSummary> {
            self.log(format!("POST /api/detect-anomalies/{}", portfolio_id));
            if self.expire_on_detect {
                return Err(ClientError::Unauthorized {
                    message: "expired".to_string(),
                });
            }
            Ok(DetectionSummary {
                message: "Detected 1 anomalies for Portfolio 2".to_string(),
                anomalies_found: 1,
                total_processed: 24,
                detection_sensitivity: 2.0,
            })
        }
    }

    #[tokio::test]
    async fn test_select_fetches_anomalies_once() {
        let mut dashboard = Dashboard::new(FakeService::default());
        assert!(dashboard.load_portfolios().await);
        assert!(dashboard.select(2).await);

        let calls = dashboard.service().calls();
        assert_eq!(
            calls.iter().filter(|c| *c == "GET /api/anomalies/2").count(),
            1
        );
        assert_eq!(calls.len(), 2);
        assert_eq!(dashboard.selected().map(|p| p.id), Some(2));
        assert_eq!(dashboard.anomalies().len(), 1);
    }

    #[tokio::test]
    async fn test_detection_awaits_before_refetch() {
        let mut dashboard = Dashboard::new(FakeService::default());
        dashboard.load_portfolios().await;
        dashboard.select(2).await;

        assert!(dashboard.run_detection().await);
        assert!(!dashboard.is_detecting());

        let calls = dashboard.service().calls();
        assert_eq!(
            &calls[2..],
            &[
                "POST /api/detect-anomalies/2".to_string(),
                "GET /api/anomalies/2".to_string()
            ]
        );
        assert_eq!(dashboard.last_detection().map(|d| d.anomalies_found), Some(1));
    }

    #[tokio::test]
    async fn test_detection_needs_selection() {
        let mut dashboard = Dashboard::new(FakeService::default());
        dashboard.load_portfolios().await;

        assert!(!dashboard.run_detection().await);
        assert_eq!(dashboard.error(), Some("Select a portfolio first"));
        assert_eq!(dashboard.service().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_portfolio_makes_no_request() {
        let mut dashboard = Dashboard::new(FakeService::default());
        dashboard.load_portfolios().await;

        assert!(!dashboard.select(42).await);
        assert_eq!(dashboard.service().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_list() {
        let service = FakeService {
            fail_anomalies: true,
            ..Default::default()
        };
        let mut dashboard = Dashboard::new(service);
        dashboard.load_portfolios().await;

        assert!(!dashboard.select(1).await);
        assert!(dashboard.anomalies().is_empty());
        assert!(dashboard.error().unwrap().starts_with("Error fetching anomalies"));
        assert!(!dashboard.needs_login());
    }

    #[tokio::test]
    async fn test_unauthorized_resets_dashboard() {
        let service = FakeService {
            expire_on_detect: true,
            ..Default::default()
        };
        let mut dashboard = Dashboard::new(service);
        dashboard.load_portfolios().await;
        dashboard.select(1).await;

        assert!(!dashboard.run_detection().await);
        assert!(dashboard.needs_login());
        assert!(dashboard.portfolios().is_empty());
        assert!(dashboard.selected().is_none());
        assert!(!dashboard.is_detecting());
    }
}
