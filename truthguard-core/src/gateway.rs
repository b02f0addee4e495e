//! Model gateway: outbound calls to the external classification API
//!
//! Provides a `ModelGateway` trait with implementations for:
//! - **Http**: the production client, one POST per classification
//! - **Stub**: fixed answers for running without a model API; never used
//!   unless `gateway.backend = "stub"` is configured
//!
//! The HTTP client makes exactly one attempt per call. Failures are returned
//! to the caller, which decides what the end user sees.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::{GatewayBackend, GatewayConfig};
use crate::models::detection::{MAX_CONFIDENCE, MIN_CONFIDENCE};
use crate::models::DetectionKind;

// ============================================================================
// ModelGateway trait
// ============================================================================

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Classify a piece of news text.
    async fn classify_news(&self, text: &str) -> Result<NewsClassification, GatewayError>;

    /// Classify a media payload of the given kind.
    async fn classify_media(
        &self,
        kind: DetectionKind,
        media_data: &str,
    ) -> Result<MediaClassification, GatewayError>;

    /// Backend name for logging and health output.
    fn name(&self) -> &str;
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsClassification {
    pub is_fake: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaClassification {
    pub confidence: f64,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct NewsPayload<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaPayload<'a> {
    media_data: &'a str,
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed model API response: {0}")]
    Malformed(String),

    #[error("Missing model API base URL")]
    MissingBaseUrl,

    #[error("Stub confidence {0} is outside [0, 100]")]
    InvalidStubConfidence(f64),
}

/// Create the gateway selected by `gateway.backend`.
pub fn create_gateway(config: &GatewayConfig) -> Result<Box<dyn ModelGateway>, GatewayError> {
    match config.backend {
        GatewayBackend::Http => Ok(Box::new(HttpModelGateway::new(config)?)),
        GatewayBackend::Stub => {
            // Every record the stub produces must pass validation.
            if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&config.stub_confidence) {
                return Err(GatewayError::InvalidStubConfidence(config.stub_confidence));
            }
            tracing::warn!(
                confidence = config.stub_confidence,
                "Stub model gateway selected; verdicts are fixed placeholders"
            );
            Ok(Box::new(StubGateway::new(config.stub_confidence)))
        }
    }
}

// ============================================================================
// HttpModelGateway
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpModelGateway {
    client: Client,
    base_url: String,
}

impl HttpModelGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_base_url(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GatewayError::MissingBaseUrl);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `payload` to `{base_url}/{route}` and decode the JSON reply.
    async fn post_json<P, R>(&self, route: &str, payload: &P) -> Result<R, GatewayError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, route);

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(url = %url, status = status.as_u16(), "Model API error");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn classify_news(&self, text: &str) -> Result<NewsClassification, GatewayError> {
        self.post_json("fakenews", &NewsPayload { text }).await
    }

    async fn classify_media(
        &self,
        kind: DetectionKind,
        media_data: &str,
    ) -> Result<MediaClassification, GatewayError> {
        let route = format!("deepfake/{}", kind);
        self.post_json(&route, &MediaPayload { media_data }).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// StubGateway
// ============================================================================

pub const STUB_MEDIA_MESSAGE: &str = "Stub analysis: no model attached";

/// Answers every request with the same fixed score. Nothing is inferred.
#[derive(Debug, Clone)]
pub struct StubGateway {
    confidence: f64,
}

impl StubGateway {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

#[async_trait]
impl ModelGateway for StubGateway {
    async fn classify_news(&self, _text: &str) -> Result<NewsClassification, GatewayError> {
        Ok(NewsClassification {
            is_fake: false,
            confidence: self.confidence,
        })
    }

    async fn classify_media(
        &self,
        _kind: DetectionKind,
        _media_data: &str,
    ) -> Result<MediaClassification, GatewayError> {
        Ok(MediaClassification {
            confidence: self.confidence,
            message: STUB_MEDIA_MESSAGE.to_string(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

// ============================================================================
// TESTS
// ============================================================================
