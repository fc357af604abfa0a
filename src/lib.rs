//! # Fee Sentinel
//!
//! Terminal dashboard and API client for asset-management fee anomaly
//! detection.
//!
//! ## Features
//!
//! - **Session handling**: bearer token and user profile persisted between runs
//! - **Authorized client**: token attached to every API request, 401 ends the session
//! - **Dashboard**: portfolios, anomalies and remote detection runs
//! - **Upload tester**: statement PDFs sent to an OCR extraction deployment
//! - **Sandbox**: in-memory backend with the same REST surface
//!
//! ## Modules
//!
//! - [`session`]: Session store and authentication state machine
//! - [`client`]: HTTP client for the asset-management API
//! - [`views`]: Controllers for the login, register, dashboard and upload screens
//! - [`render`]: Table, CSV and chart text output
//! - [`sandbox`]: Local backend with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fee_sentinel::client::{ApiClient, ClientConfig};
//! use fee_sentinel::session::{FileSessionStore, SessionManager};
//! use fee_sentinel::views::{Dashboard, LoginForm};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileSessionStore::new("session.json"));
//!     let session = Arc::new(SessionManager::restore(store));
//!     let client = ApiClient::new(&ClientConfig::default(), session)?;
//!
//!     let mut form = LoginForm::new("ada@example.com", "secret");
//!     if form.submit(&client).await.is_none() {
//!         eprintln!("{}", form.error().unwrap_or("Login failed"));
//!         return Ok(());
//!     }
//!
//!     let mut dashboard = Dashboard::new(client);
//!     dashboard.load_portfolios().await;
//!     dashboard.select(1).await;
//!     println!("{} anomalies", dashboard.anomalies().len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod logging;
pub mod models;
pub mod render;
pub mod sandbox;
pub mod session;
pub mod views;

// Re-export top-level types for convenience
pub use client::{
    ApiClient, AuthService, ClientConfig, ClientError, ClientResult, ExtractionService,
    PortfolioService,
};

pub use models::{
    Anomaly, DetectionSummary, ExtractedFields, ExtractionResponse, LoginRequest, Portfolio,
    RegisterRequest, Session, User,
};

pub use session::{
    AuthState, FileSessionStore, MemorySessionStore, SessionError, SessionEvent, SessionManager,
    SessionStore,
};

pub use views::{
    Dashboard, FormError, LoginForm, PdfFile, RegisterForm, UploadEndpoints, UploadError,
    UploadTarget, UploadTester,
};

pub use render::OutputFormat;

pub use sandbox::{build_router, serve, SandboxConfig, SandboxState};

pub use config::{Config, ConfigError, LoggingConfig};
