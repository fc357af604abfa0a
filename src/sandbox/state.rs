//! Sandbox State
//!
//! In-memory ledger shared by all sandbox handlers.
//! Wrapped in Arc for sharing across async tasks.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use tokio::sync::RwLock;

use crate::models::{Anomaly, Portfolio, User};

/// Requests kept in the inspection log
const REQUEST_LOG_CAPACITY: usize = 256;

/// Sandbox server configuration
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Reject portfolio and anomaly reads without a valid bearer token
    pub require_auth: bool,
    /// Minimum |z-score| of a fee amount to be flagged
    pub z_threshold: f64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            require_auth: true,
            z_threshold: 2.0,
        }
    }
}

impl SandboxConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Registered account
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password: String,
}

/// A fee charged against a portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct Fee {
    pub id: i64,
    pub portfolio_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
}

/// A flagged fee
#[derive(Debug, Clone)]
pub struct AnomalyRecord {
    pub id: i64,
    pub portfolio_id: i64,
    pub fee_id: i64,
    pub score: f64,
    pub detected_at: DateTime<Utc>,
}

/// One request as seen by the sandbox
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

/// Mutable sandbox data
#[derive(Debug, Default)]
pub struct Ledger {
    pub accounts: Vec<Account>,
    pub tokens: HashMap<String, i64>,
    pub portfolios: Vec<Portfolio>,
    pub fees: Vec<Fee>,
    pub anomalies: Vec<AnomalyRecord>,
    next_user_id: i64,
    next_anomaly_id: i64,
}

impl Ledger {
    pub fn next_user_id(&mut self) -> i64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub fn next_anomaly_id(&mut self) -> i64 {
        self.next_anomaly_id += 1;
        self.next_anomaly_id
    }

    pub fn portfolio(&self, id: i64) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.id == id)
    }

    pub fn fees_for(&self, portfolio_id: i64) -> Vec<Fee> {
        let mut fees: Vec<Fee> = self
            .fees
            .iter()
            .filter(|f| f.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        fees.sort_by_key(|f| f.date);
        fees
    }

    /// Anomalies joined with their fee rows
    pub fn anomalies_for(&self, portfolio_id: i64) -> Vec<Anomaly> {
        self.anomalies
            .iter()
            .filter(|a| a.portfolio_id == portfolio_id)
            .map(|a| {
                let fee = self.fees.iter().find(|f| f.id == a.fee_id);
                Anomaly {
                    id: a.id,
                    fee_id: Some(a.fee_id),
                    anomaly_score: a.score,
                    detected_at: Some(a.detected_at.to_rfc3339()),
                    fee_amount: fee.map(|f| f.amount),
                    fee_date: fee.map(|f| f.date.to_string()),
                }
            })
            .collect()
    }

    pub fn user_for_token(&self, token: &str) -> Option<&User> {
        let id = self.tokens.get(token)?;
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == *id)
    }
}

/// Shared state for all sandbox handlers
#[derive(Debug)]
pub struct SandboxState {
    pub config: SandboxConfig,
    pub ledger: RwLock<Ledger>,
    requests: RwLock<VecDeque<RecordedRequest>>,
    start_time: Instant,
}

impl SandboxState {
    /// Empty sandbox: no portfolios, no accounts
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_ledger(config, Ledger::default())
    }

    /// Sandbox loaded with the sample portfolios and their fee history
    pub fn seeded(config: SandboxConfig) -> Self {
        let mut ledger = Ledger::default();
        super::seed::populate(&mut ledger);
        Self::with_ledger(config, ledger)
    }

    fn with_ledger(config: SandboxConfig, ledger: Ledger) -> Self {
        Self {
            config,
            ledger: RwLock::new(ledger),
            requests: RwLock::new(VecDeque::new()),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn record(&self, request: RecordedRequest) {
        let mut log = self.requests.write().await;
        if log.len() == REQUEST_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(request);
    }

    /// Most recent requests, oldest first
    pub async fn recent_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.iter().cloned().collect()
    }

    /// Number of recorded requests for `method path`
    pub async fn hits(&self, method: &str, path: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}
