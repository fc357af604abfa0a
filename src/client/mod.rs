//! Asset-Management API Client
//!
//! HTTP client for the portfolio, anomaly, auth and OCR upload endpoints.
//!
//! Every request to the main API goes through [`ApiClient::send`], which
//!
//! 1. attaches `Authorization: Bearer <token>` when a session is stored, and
//! 2. treats any 401 answer as session expiry: the stored session is cleared
//!    and the call fails with [`ClientError::Unauthorized`].
//!
//! The OCR upload endpoint is a separate deployment and never receives the
//! token.

mod error;
mod service;

pub use error::{ClientError, ClientResult};
pub use service::{AuthService, ExtractionService, PortfolioService};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{
    Anomaly, DetectionSummary, ErrorBody, ExtractionResponse, LoginRequest, LoginResponse,
    Portfolio, RegisterRequest, RegisterResponse, Session, User,
};
use crate::session::SessionManager;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://127.0.0.1:5000")
    pub base_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Authorized client for the asset-management API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client bound to the given session
    pub fn new(config: &ClientConfig, session: Arc<SessionManager>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request against the main API with the bearer token attached
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and apply the 401 policy
    ///
    /// Non-success statuses become [`ClientError::Api`] carrying the server's
    /// `message` (or `error`) field.
    pub async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, &self.base_url))?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;

        if status == StatusCode::UNAUTHORIZED {
            // Memory state is already cleared; a store failure must not hide the 401
            if let Err(e) = self.session.expire() {
                tracing::error!("Failed to clear stored session: {}", e);
            }
            return Err(ClientError::Unauthorized { message });
        }

        tracing::debug!(status = status.as_u16(), %message, "API returned error");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    /// GET /api/auth/me
    pub async fn current_user(&self) -> ClientResult<User> {
        self.get_json("/api/auth/me").await
    }

    /// Forget the stored session
    pub fn logout(&self) -> ClientResult<()> {
        self.session.logout()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> ClientResult<Session> {
        let request = self
            .request(Method::POST, "/api/auth/login")
            .json(credentials);
        let response = self.send(request).await?;
        let body: LoginResponse = decode(response).await?;

        let session = Session::from(body);
        self.session.login_succeeded(session.clone())?;
        Ok(session)
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse> {
        let builder = self
            .request(Method::POST, "/api/auth/register")
            .json(request);
        let response = self.send(builder).await?;

        // Only 201 means the account exists now
        if response.status() != StatusCode::CREATED {
            let status = response.status().as_u16();
            return Err(ClientError::Api {
                status,
                message: format!("Unexpected status {}", status),
            });
        }
        decode(response).await
    }
}

#[async_trait::async_trait]
impl PortfolioService for ApiClient {
    async fn portfolios(&self) -> ClientResult<Vec<Portfolio>> {
        self.get_json("/api/portfolios").await
    }

    async fn anomalies(&self, portfolio_id: i64) -> ClientResult<Vec<Anomaly>> {
        self.get_json(&format!("/api/anomalies/{}", portfolio_id))
            .await
    }

    async fn detect_anomalies(&self, portfolio_id: i64) -> ClientResult<DetectionSummary> {
        let path = format!("/api/detect-anomalies/{}", portfolio_id);
        let response = self.send(self.request(Method::POST, &path)).await?;
        decode(response).await
    }
}

#[async_trait::async_trait]
impl ExtractionService for ApiClient {
    async fn upload_pdf(
        &self,
        endpoint: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<ExtractionResponse> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(e, endpoint))?;

        // The extraction service reports failures in the JSON body, whatever the status
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ClientError::Decode(format!("upload answered {} with unreadable body: {}", status, e))
        })
    }
}

/// Map reqwest failures onto the client's transport errors
fn transport_error(e: reqwest::Error, target: &str) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::Unavailable(target.to_string())
    } else {
        ClientError::Request(e)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body
            .describe()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        Err(_) if !text.trim().is_empty() => text,
        Err(_) => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{build_router, SandboxConfig, SandboxState};
    use crate::session::{AuthState, FileSessionStore, MemorySessionStore, SessionStore};
    use crate::views::Dashboard;
    use tempfile::tempdir;

    async fn spawn_sandbox() -> (String, Arc<SandboxState>) {
        let state = Arc::new(SandboxState::seeded(SandboxConfig::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}", addr), state)
    }

    fn client_for(base_url: &str, store: Arc<dyn SessionStore>) -> ApiClient {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        };
        ApiClient::new(&config, Arc::new(SessionManager::restore(store))).unwrap()
    }

    async fn sign_up_and_in(client: &ApiClient) -> Session {
        client
            .register(&RegisterRequest {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "engine".to_string(),
            })
            .await
            .unwrap();
        client
            .login(&LoginRequest {
                email: "ada@example.com".to_string(),
                password: "engine".to_string(),
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = client_for("http://api.test/", Arc::new(MemorySessionStore::new()));
        assert_eq!(client.base_url(), "http://api.test");
        assert_eq!(client.url("/api/portfolios"), "http://api.test/api/portfolios");
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let (url, state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));

        let err = client.portfolios().await.unwrap_err();
        assert!(err.is_unauthorized());

        let log = state.recent_requests().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].authorization, None);
    }

    #[tokio::test]
    async fn test_stored_token_is_sent_as_bearer() {
        let (url, state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));
        let session = sign_up_and_in(&client).await;

        let portfolios = client.portfolios().await.unwrap();
        assert_eq!(portfolios.len(), 4);

        let log = state.recent_requests().await;
        let last = log.last().unwrap();
        assert_eq!(last.path, "/api/portfolios");
        assert_eq!(
            last.authorization.as_deref(),
            Some(format!("Bearer {}", session.token).as_str())
        );
    }

    #[tokio::test]
    async fn test_unauthorized_clears_stored_session() {
        let (url, _state) = spawn_sandbox().await;
        let dir = tempdir().unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));

        let client = client_for(&url, store.clone());
        let mut session = sign_up_and_in(&client).await;
        assert!(store.load().is_some());

        // Simulate a token the server no longer honours
        session.token = "revoked".to_string();
        client.session().login_succeeded(session).unwrap();

        let err = client.anomalies(1).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(client.session().state(), AuthState::Unauthenticated);
        assert!(store.load().is_none());
    }

    /// Holds a session but cannot delete it
    struct ReadOnlyStore(MemorySessionStore);

    impl SessionStore for ReadOnlyStore {
        fn load(&self) -> Option<Session> {
            self.0.load()
        }

        fn save(&self, session: &Session) -> crate::session::SessionResult<()> {
            self.0.save(session)
        }

        fn clear(&self) -> crate::session::SessionResult<()> {
            Err(crate::session::SessionError::Remove {
                path: "session.json".into(),
                error: "read-only file system".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_unauthorized_survives_store_failure() {
        let (url, _state) = spawn_sandbox().await;
        let stale = Session {
            token: "revoked".to_string(),
            user: crate::models::User {
                id: 1,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
        };
        let store = Arc::new(ReadOnlyStore(MemorySessionStore::with_session(stale)));
        let client = client_for(&url, store);
        assert!(client.session().is_authenticated());

        let mut dashboard = Dashboard::new(client.clone());
        assert!(!dashboard.load_portfolios().await);

        assert!(dashboard.needs_login());
        assert_eq!(dashboard.error(), Some("Session expired, please sign in again"));
        assert!(!client.session().is_authenticated());
        assert!(client.anomalies(1).await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_failure_message() {
        let (url, _state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));

        let err = client
            .login(&LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "x".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message("Login failed"), "Invalid email or password");
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let (url, _state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));
        sign_up_and_in(&client).await;

        let err = client
            .register(&RegisterRequest {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "again".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_current_user() {
        let (url, _state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));
        sign_up_and_in(&client).await;

        let user = client.current_user().await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_dashboard_selection_hits_anomalies_once() {
        let (url, state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));
        sign_up_and_in(&client).await;

        let mut dashboard = Dashboard::new(client);
        assert!(dashboard.load_portfolios().await);
        assert!(dashboard.select(3).await);

        assert_eq!(state.hits("GET", "/api/anomalies/3").await, 1);

        assert!(dashboard.run_detection().await);
        assert!(!dashboard.anomalies().is_empty());
        assert_eq!(state.hits("POST", "/api/detect-anomalies/3").await, 1);
        assert_eq!(state.hits("GET", "/api/anomalies/3").await, 2);
    }

    #[tokio::test]
    async fn test_upload_pdf_skips_bearer() {
        let (url, state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));
        sign_up_and_in(&client).await;

        let endpoint = format!("{}/api/upload-pdf", url);
        let response = client
            .upload_pdf(
                &endpoint,
                "statement.pdf",
                b"%PDF-1.4\n(Rent: $900.00) (Total: $900.00)".to_vec(),
            )
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.data.unwrap().rent, Some(900.0));

        let log = state.recent_requests().await;
        let upload = log.last().unwrap();
        assert_eq!(upload.path, "/api/upload-pdf");
        assert_eq!(upload.authorization, None);
    }

    #[tokio::test]
    async fn test_upload_rejection_is_structured() {
        let (url, _state) = spawn_sandbox().await;
        let client = client_for(&url, Arc::new(MemorySessionStore::new()));

        let endpoint = format!("{}/api/upload-pdf", url);
        let response = client
            .upload_pdf(&endpoint, "fake.pdf", b"GIF89a".to_vec())
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Invalid file type"));
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr), Arc::new(MemorySessionStore::new()));
        let err = client.portfolios().await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable(_)));
    }
}
