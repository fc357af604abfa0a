//! Sandbox Backend
//!
//! In-memory stand-in for the asset-management API, built with Axum. Serves
//! the same REST surface the client consumes so the CLI can be exercised
//! locally and the client can be tested end to end.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/auth/register` - Create an account (201)
//! - `POST /api/auth/login` - Get a bearer token
//! - `GET /api/auth/me` - Current user (token required)
//!
//! ## Portfolios
//! - `GET /api/portfolios` - List portfolios
//! - `GET /api/anomalies/:portfolio_id` - Anomalies of a portfolio
//! - `POST /api/detect-anomalies/:portfolio_id` - Run detection
//!
//! ## OCR
//! - `POST /api/upload-pdf` - Extract amounts from a statement PDF
//!
//! ## Health
//! - `GET /health` - Status
//!
//! Accounts, tokens and anomalies live in memory and vanish on restart.

pub mod auth;
pub mod detection;
pub mod dto;
pub mod error;
pub mod extraction;
pub mod routes;
pub mod seed;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{RecordedRequest, SandboxConfig, SandboxState};

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the sandbox router with all routes and middleware
pub fn build_router(state: Arc<SandboxState>) -> Router {
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        // Portfolio routes
        .route("/portfolios", get(routes::portfolios::list_portfolios))
        .route(
            "/anomalies/:portfolio_id",
            get(routes::portfolios::list_anomalies),
        )
        .route(
            "/detect-anomalies/:portfolio_id",
            post(routes::portfolios::detect_anomalies),
        )
        // Upload route - statements can be large (20 MB)
        .route("/upload-pdf", post(routes::upload::upload_pdf))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(routes::health::health))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            record_request,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Keep a copy of each request line and its Authorization header
async fn record_request(
    State(state): State<Arc<SandboxState>>,
    request: Request,
    next: Next,
) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    state.record(recorded).await;
    next.run(request).await
}

/// Start the sandbox server
pub async fn serve(state: Arc<SandboxState>) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Sandbox API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Sandbox API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app(require_auth: bool) -> (Router, Arc<SandboxState>) {
        let config = SandboxConfig {
            require_auth,
            ..SandboxConfig::default()
        };
        let state = Arc::new(SandboxState::seeded(config));
        (build_router(Arc::clone(&state)), state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn register_and_login(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"first_name": "Ada", "last_name": "Lovelace",
                    "email": "ada@example.com", "password": "engine"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email": "ada@example.com", "password": "engine"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _state) = create_test_app(true);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["portfolios"], 4);
    }

    #[tokio::test]
    async fn test_portfolios_require_token() {
        let (app, _state) = create_test_app(true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/portfolios")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_open_sandbox_serves_without_token() {
        let (app, _state) = create_test_app(false);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/portfolios")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // A bad token is still rejected
        let response = app
            .oneshot(get_with_token("/api/portfolios", "bogus"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let (app, _state) = create_test_app(true);

        let response = app
            .clone()
            .oneshot(post_json("/api/auth/register", r#"{"email": "x@y.z"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Missing required fields");

        register_and_login(&app).await;

        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"first_name": "A", "last_name": "L",
                    "email": "ADA@example.com", "password": "other"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let (app, _state) = create_test_app(true);
        register_and_login(&app).await;

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email": "ada@example.com", "password": "wrong"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_password_is_kept_as_typed() {
        let (app, _state) = create_test_app(true);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"first_name": "Ada", "last_name": "Lovelace",
                    "email": "ada@example.com", "password": " secret "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email": "ada@example.com", "password": " secret "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email": "ada@example.com", "password": "secret"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_new_login_revokes_previous_token() {
        let (app, state) = create_test_app(true);
        let first = register_and_login(&app).await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email": "ada@example.com", "password": "engine"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let second = body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        assert_eq!(state.ledger.read().await.tokens.len(), 1);

        let response = app
            .clone()
            .oneshot(get_with_token("/api/auth/me", &first))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(get_with_token("/api/auth/me", &second))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_me_returns_profile() {
        let (app, _state) = create_test_app(true);
        let token = register_and_login(&app).await;

        let response = app
            .oneshot(get_with_token("/api/auth/me", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_detection_replaces_anomalies() {
        let (app, _state) = create_test_app(true);
        let token = register_and_login(&app).await;

        let detect = || {
            Request::builder()
                .method("POST")
                .uri("/api/detect-anomalies/2")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(detect()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["total_processed"], 24);
        let found = summary["anomalies_found"].as_u64().unwrap();
        assert!(found >= 1);

        // A second run does not accumulate
        app.clone().oneshot(detect()).await.unwrap();

        let response = app
            .oneshot(get_with_token("/api/anomalies/2", &token))
            .await
            .unwrap();
        let anomalies = body_json(response).await;
        assert_eq!(anomalies.as_array().unwrap().len() as u64, found);
        assert!(anomalies[0]["fee_amount"].is_number());
    }

    #[tokio::test]
    async fn test_detect_unknown_portfolio() {
        let (app, _state) = create_test_app(false);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/detect-anomalies/99")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let (app, state) = create_test_app(true);
        app.oneshot(get_with_token("/api/portfolios", "abc"))
            .await
            .unwrap();

        let log = state.recent_requests().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].path, "/api/portfolios");
        assert_eq!(log[0].authorization.as_deref(), Some("Bearer abc"));
    }
}
