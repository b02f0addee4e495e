//! Detection request handling
//!
//! Each submission is one stateless cycle: check the input, ask the model
//! gateway, derive the verdict, write one record, return the verdict. Any
//! failure after input checking is reported to the caller as a single opaque
//! server error; the cause is only logged.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use truthguard_core::{
    DetectionKind, DetectionRecord, GatewayError, ModelGateway, RecordStore, StoreError,
    ValidationError,
};

pub const NO_TEXT_ERROR: &str = "No text provided";
pub const INVALID_INPUT_ERROR: &str = "Invalid input";
pub const SERVER_ERROR: &str = "Server Error";

pub const FAKE_NEWS_MESSAGE: &str = "Fake news detected";
pub const AUTHENTIC_NEWS_MESSAGE: &str = "News appears authentic";

/// Media scoring strictly above this is authentic.
pub const MEDIA_AUTHENTICITY_THRESHOLD: f64 = 50.0;

#[derive(Debug, Deserialize, Default)]
pub struct NewsDetectionRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetectionRequest {
    pub media_type: Option<String>,
    pub media_data: Option<String>,
}

/// What the caller gets back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_authentic: bool,
    pub confidence: f64,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl DetectionError {
    pub fn status(&self) -> StatusCode {
        match self {
            DetectionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The only text a caller ever sees for this error.
    pub fn public_message(&self) -> &'static str {
        match self {
            DetectionError::InvalidInput(msg) => *msg,
            _ => SERVER_ERROR,
        }
    }
}

pub fn media_is_authentic(confidence: f64) -> bool {
    confidence > MEDIA_AUTHENTICITY_THRESHOLD
}

pub async fn submit_news_detection(
    gateway: &dyn ModelGateway,
    store: &dyn RecordStore,
    req: NewsDetectionRequest,
) -> Result<Verdict, DetectionError> {
    // Presence check only: whitespace-only text is forwarded as-is.
    let text = match req.text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(DetectionError::InvalidInput(NO_TEXT_ERROR)),
    };

    let classification = gateway.classify_news(&text).await?;

    let is_authentic = !classification.is_fake;
    let message = if classification.is_fake {
        FAKE_NEWS_MESSAGE
    } else {
        AUTHENTIC_NEWS_MESSAGE
    };

    let record = DetectionRecord::new(
        DetectionKind::News,
        text,
        is_authentic,
        classification.confidence,
        message,
    );
    store.insert(&record).await?;

    tracing::info!(
        id = %record.id,
        kind = "news",
        is_authentic,
        confidence = classification.confidence,
        "News detection recorded"
    );

    Ok(Verdict {
        is_authentic,
        confidence: classification.confidence,
        message: message.to_string(),
    })
}

pub async fn submit_media_detection(
    gateway: &dyn ModelGateway,
    store: &dyn RecordStore,
    req: MediaDetectionRequest,
) -> Result<Verdict, DetectionError> {
    let (media_type, media_data) = match (req.media_type, req.media_data) {
        (Some(t), Some(d)) if !t.is_empty() && !d.is_empty() => (t, d),
        _ => return Err(DetectionError::InvalidInput(INVALID_INPUT_ERROR)),
    };

    // Unknown types never reach the model API.
    let kind = DetectionKind::parse_media(&media_type)?;

    let classification = gateway.classify_media(kind, &media_data).await?;
    let is_authentic = media_is_authentic(classification.confidence);

    let record = DetectionRecord::new(
        kind,
        media_data,
        is_authentic,
        classification.confidence,
        classification.message.clone(),
    );
    store.insert(&record).await?;

    tracing::info!(
        id = %record.id,
        kind = %kind,
        is_authentic,
        confidence = classification.confidence,
        "Media detection recorded"
    );

    Ok(Verdict {
        is_authentic,
        confidence: classification.confidence,
        message: classification.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use truthguard_core::{MediaClassification, MemoryRecordStore, NewsClassification};

    /// Gateway returning canned replies; `None` means the call fails.
    #[derive(Default)]
    struct CannedGateway {
        news: Option<NewsClassification>,
        media: Option<MediaClassification>,
        calls: AtomicUsize,
    }

    impl CannedGateway {
        fn news(is_fake: bool, confidence: f64) -> Self {
            Self {
                news: Some(NewsClassification { is_fake, confidence }),
                ..Default::default()
            }
        }

        fn media(confidence: f64, message: &str) -> Self {
            Self {
                media: Some(MediaClassification {
                    confidence,
                    message: message.to_string(),
                }),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelGateway for CannedGateway {
        async fn classify_news(&self, _text: &str) -> Result<NewsClassification, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.news.clone().ok_or(GatewayError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }

        async fn classify_media(
            &self,
            _kind: DetectionKind,
            _media_data: &str,
        ) -> Result<MediaClassification, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.media.clone().ok_or(GatewayError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn news_req(text: Option<&str>) -> NewsDetectionRequest {
        NewsDetectionRequest {
            text: text.map(str::to_string),
        }
    }

    fn media_req(media_type: Option<&str>, media_data: Option<&str>) -> MediaDetectionRequest {
        MediaDetectionRequest {
            media_type: media_type.map(str::to_string),
            media_data: media_data.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_fake_news_verdict_and_record() {
        let gateway = CannedGateway::news(true, 92.0);
        let store = MemoryRecordStore::new();

        let verdict = submit_news_detection(
            &gateway,
            &store,
            news_req(Some("Doctors hate this miracle cure")),
        )
        .await
        .unwrap();

        assert_eq!(
            verdict,
            Verdict {
                is_authentic: false,
                confidence: 92.0,
                message: FAKE_NEWS_MESSAGE.to_string(),
            }
        );

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DetectionKind::News);
        assert_eq!(records[0].data, "Doctors hate this miracle cure");
        assert!(!records[0].is_authentic);
        assert_eq!(records[0].confidence, 92.0);
        assert_eq!(records[0].message, FAKE_NEWS_MESSAGE);
    }

    #[tokio::test]
    async fn test_authentic_news_verdict() {
        let gateway = CannedGateway::news(false, 12.0);
        let store = MemoryRecordStore::new();

        let verdict = submit_news_detection(&gateway, &store, news_req(Some("Rain expected")))
            .await
            .unwrap();

        assert!(verdict.is_authentic);
        assert_eq!(verdict.message, AUTHENTIC_NEWS_MESSAGE);
        assert_eq!(store.records()[0].message, AUTHENTIC_NEWS_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_or_empty_text_is_invalid_input() {
        let gateway = CannedGateway::news(true, 90.0);
        let store = MemoryRecordStore::new();

        for req in [news_req(None), news_req(Some(""))] {
            let err = submit_news_detection(&gateway, &store, req).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.public_message(), NO_TEXT_ERROR);
        }

        assert_eq!(gateway.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_text_is_forwarded() {
        let gateway = CannedGateway::news(false, 5.0);
        let store = MemoryRecordStore::new();

        let result = submit_news_detection(&gateway, &store, news_req(Some("   "))).await;
        assert!(result.is_ok());
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_media_threshold_is_strict() {
        for (confidence, expected) in [(50.0, false), (50.1, true), (49.9, false), (100.0, true)] {
            let gateway = CannedGateway::media(confidence, "analysed");
            let store = MemoryRecordStore::new();

            let verdict = submit_media_detection(
                &gateway,
                &store,
                media_req(Some("image"), Some("aGVsbG8=")),
            )
            .await
            .unwrap();

            assert_eq!(verdict.is_authentic, expected, "confidence {}", confidence);
            assert_eq!(store.records()[0].is_authentic, expected);
        }
    }

    #[tokio::test]
    async fn test_media_record_matches_submission() {
        let gateway = CannedGateway::media(71.0, "No manipulation found");
        let store = MemoryRecordStore::new();

        let verdict = submit_media_detection(&gateway, &store, media_req(Some("audio"), Some("UklGRg==")))
            .await
            .unwrap();

        assert_eq!(verdict.message, "No manipulation found");
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DetectionKind::Audio);
        assert_eq!(records[0].data, "UklGRg==");
        assert_eq!(records[0].message, "No manipulation found");
        assert_eq!(records[0].confidence, 71.0);
    }

    #[tokio::test]
    async fn test_media_missing_fields_is_invalid_input() {
        let gateway = CannedGateway::media(80.0, "x");
        let store = MemoryRecordStore::new();

        for req in [
            media_req(None, Some("data")),
            media_req(Some("image"), None),
            media_req(Some(""), Some("data")),
            media_req(None, None),
        ] {
            let err = submit_media_detection(&gateway, &store, req).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.public_message(), INVALID_INPUT_ERROR);
        }
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_media_type_fails_before_upstream() {
        let gateway = CannedGateway::media(80.0, "x");
        let store = MemoryRecordStore::new();

        for media_type in ["text", "news"] {
            let err = submit_media_detection(&gateway, &store, media_req(Some(media_type), Some("d")))
                .await
                .unwrap_err();
            assert!(matches!(err, DetectionError::Validation(_)));
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.public_message(), SERVER_ERROR);
        }

        assert_eq!(gateway.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_opaque_and_writes_nothing() {
        let gateway = CannedGateway::default();
        let store = MemoryRecordStore::new();

        let err = submit_news_detection(&gateway, &store, news_req(Some("headline")))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::Upstream(_)));
        assert_eq!(err.public_message(), SERVER_ERROR);

        let err = submit_media_detection(&gateway, &store, media_req(Some("video"), Some("d")))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::Upstream(_)));

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_storage_error() {
        let store = MemoryRecordStore::new();

        let err = submit_news_detection(&CannedGateway::news(true, 101.0), &store, news_req(Some("t")))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::Storage(StoreError::Validation(_))));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = submit_media_detection(
            &CannedGateway::media(-1.0, "x"),
            &store,
            media_req(Some("image"), Some("d")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DetectionError::Storage(StoreError::Validation(_))));

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_upstream_message_rejected() {
        let gateway = CannedGateway::media(60.0, "");
        let store = MemoryRecordStore::new();

        let err = submit_media_detection(&gateway, &store, media_req(Some("image"), Some("d")))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::Storage(_)));
        assert!(store.is_empty());
    }
}
