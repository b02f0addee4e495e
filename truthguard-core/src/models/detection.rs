use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 100.0;

/// The kind of content a detection was run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    News,
    Image,
    Video,
    Audio,
}

impl DetectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionKind::News => "news",
            DetectionKind::Image => "image",
            DetectionKind::Video => "video",
            DetectionKind::Audio => "audio",
        }
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, DetectionKind::News)
    }

    /// Parse a media type as submitted to the deepfake route. `news` is not a
    /// media type and is rejected like any unknown value.
    pub fn parse_media(s: &str) -> Result<Self, ValidationError> {
        match s.parse::<DetectionKind>() {
            Ok(kind) if kind.is_media() => Ok(kind),
            _ => Err(ValidationError::UnsupportedMediaType(s.to_string())),
        }
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "news" => Ok(DetectionKind::News),
            "image" => Ok(DetectionKind::Image),
            "video" => Ok(DetectionKind::Video),
            "audio" => Ok(DetectionKind::Audio),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// Schema violations caught before a record reaches storage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown detection type `{0}`")]
    UnknownKind(String),

    #[error("unsupported media type `{0}`")]
    UnsupportedMediaType(String),

    #[error("confidence {0} is outside [0, 100]")]
    ConfidenceOutOfRange(f64),

    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
}

/// One analysed submission. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: DetectionKind,
    pub data: String,
    pub is_authentic: bool,
    pub confidence: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl DetectionRecord {
    pub fn new(
        kind: DetectionKind,
        data: impl Into<String>,
        is_authentic: bool,
        confidence: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            data: data.into(),
            is_authentic,
            confidence,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        // NaN fails both comparisons, so it is rejected here too.
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&self.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange(self.confidence));
        }
        if self.data.is_empty() {
            return Err(ValidationError::EmptyField("data"));
        }
        if self.message.is_empty() {
            return Err(ValidationError::EmptyField("message"));
        }
        Ok(())
    }
}
