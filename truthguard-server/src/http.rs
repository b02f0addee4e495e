//! TruthGuard HTTP API
//!
//! Axum server exposing the detection routes. Each endpoint has a thin axum
//! handler that delegates to an inner function returning `(StatusCode, body)`,
//! so the inner functions can be tested without axum dispatch.
//!
//! Endpoints:
//! - POST /api/fakenews: classify news text
//! - POST /api/deepfake: classify an image, video or audio payload
//! - GET  /health: record store liveness
//! - GET  /version: server version info

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use truthguard_core::config::HttpConfig;
use truthguard_core::{ModelGateway, RecordStore};

use crate::detect::{self, DetectionError, MediaDetectionRequest, NewsDetectionRequest};

const DEFAULT_BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub gateway: Arc<dyn ModelGateway>,
    pub store: Arc<dyn RecordStore>,
    pub body_limit_bytes: usize,
}

impl HttpState {
    pub fn new(gateway: Arc<dyn ModelGateway>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            gateway,
            store,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }

    pub fn with_body_limit(mut self, body_limit_bytes: usize) -> Self {
        self.body_limit_bytes = body_limit_bytes;
        self
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/fakenews", post(fakenews_handler))
        .route("/api/deepfake", post(deepfake_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: &HttpConfig,
    state: Arc<HttpState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = config.bind_addr();
    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("TruthGuard HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub async fn fakenews_inner(
    state: &HttpState,
    req: NewsDetectionRequest,
) -> (StatusCode, serde_json::Value) {
    match detect::submit_news_detection(state.gateway.as_ref(), state.store.as_ref(), req).await {
        Ok(verdict) => (StatusCode::OK, json!(verdict)),
        Err(e) => error_body(e),
    }
}

pub async fn deepfake_inner(
    state: &HttpState,
    req: MediaDetectionRequest,
) -> (StatusCode, serde_json::Value) {
    match detect::submit_media_detection(state.gateway.as_ref(), state.store.as_ref(), req).await {
        Ok(verdict) => (StatusCode::OK, json!(verdict)),
        Err(e) => error_body(e),
    }
}

pub async fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    match state.store.ping().await {
        Ok(store_version) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "store": state.store.name(),
                "store_version": store_version,
                "gateway": state.gateway.name(),
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

pub fn version_inner() -> serde_json::Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "truthguard",
    })
}

/// Log the real cause and return only the public message.
pub fn error_body(err: DetectionError) -> (StatusCode, serde_json::Value) {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, "Detection request failed");
    } else {
        tracing::debug!(error = %err, "Detection request rejected");
    }
    (status, json!({ "error": err.public_message() }))
}

// ============================================================================
// Axum handler wrappers
// ============================================================================

pub async fn fakenews_handler(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<NewsDetectionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => match unreadable_body(rejection) {
            Some(resp) => return resp,
            None => NewsDetectionRequest::default(),
        },
    };
    let (status, body) = fakenews_inner(&state, req).await;
    (status, Json(body))
}

pub async fn deepfake_handler(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<MediaDetectionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => match unreadable_body(rejection) {
            Some(resp) => return resp,
            None => MediaDetectionRequest::default(),
        },
    };
    let (status, body) = deepfake_inner(&state, req).await;
    (status, Json(body))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

/// Oversized bodies get a 413. Any other unparseable body is treated as an
/// empty submission, which the route then rejects as missing input.
fn unreadable_body(rejection: JsonRejection) -> Option<(StatusCode, Json<serde_json::Value>)> {
    tracing::debug!(error = %rejection.body_text(), "Request body not usable as JSON");
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Some((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "Payload too large" })),
        ));
    }
    None
}
