//! Axum-based API server.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use geoproof_ingest::Ingestor;
use geoproof_store::VerificationStore;

use crate::handlers;
use crate::webhook::Webhook;
use crate::ApiError;

/// Body limit for the submission route: the 10 MiB photo cap plus headroom
/// for multipart framing and the metadata fields. Oversize photos within
/// this limit get the validator's 413; beyond it axum rejects outright.
const SUBMIT_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Shared state passed by reference into every request handler. The store
/// is the only cross-request mutable state in the system.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VerificationStore>,
    pub ingestor: Arc<Ingestor>,
    pub webhook: Option<Arc<Webhook>>,
    /// Deployment environment label echoed by the health endpoint.
    pub env: String,
}

impl AppState {
    pub fn new(store: Arc<dyn VerificationStore>, ingestor: Ingestor) -> Self {
        Self {
            store,
            ingestor: Arc::new(ingestor),
            webhook: None,
            env: "development".to_string(),
        }
    }

    pub fn with_webhook(mut self, webhook: Webhook) -> Self {
        self.webhook = Some(Arc::new(webhook));
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }
}

/// Build the API router for the given state.
pub fn router(state: AppState, allowed_origin: Option<&str>) -> Router {
    Router::new()
        .route(
            "/api/verify",
            post(handlers::submit_verification).layer(DefaultBodyLimit::max(SUBMIT_BODY_LIMIT)),
        )
        .route("/api/verify/:transaction_id", get(handlers::get_verification))
        .route("/api/verifications", get(handlers::list_verifications))
        .route("/api/photo/:filename", get(handlers::get_photo))
        .route("/api/health", get(handlers::health))
        .layer(cors_layer(allowed_origin))
        .with_state(state)
}

/// Permissive CORS by default; a concrete origin locks it down.
fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origin {
        Some(origin) if origin != "*" => match origin.parse::<HeaderValue>() {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                warn!("invalid allowed origin {origin:?}, falling back to any");
                layer.allow_origin(Any)
            }
        },
        _ => layer.allow_origin(Any),
    }
}

/// The API server, configured with a port and shared state.
pub struct ApiServer {
    pub port: u16,
    pub state: AppState,
    pub allowed_origin: Option<String>,
}

impl ApiServer {
    pub fn new(port: u16, state: AppState) -> Self {
        Self {
            port,
            state,
            allowed_origin: None,
        }
    }

    pub fn with_allowed_origin(mut self, origin: Option<String>) -> Self {
        self.allowed_origin = origin;
        self
    }

    /// Start serving. Runs until the server is shut down.
    pub async fn start(&self) -> Result<(), ApiError> {
        let app = router(self.state.clone(), self.allowed_origin.as_deref());
        let addr = format!("0.0.0.0:{}", self.port);
        info!("API server listening on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(())
    }
}
