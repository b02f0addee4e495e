//! Record store: append-only persistence of `DetectionRecord`s
//!
//! Every implementation validates a record before writing it; a record that
//! fails validation is never written. There is no read-back, update or delete
//! path.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;
use thiserror::Error;

use crate::models::{DetectionRecord, ValidationError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Validate and persist one record.
    async fn insert(&self, record: &DetectionRecord) -> Result<(), StoreError>;

    /// Liveness probe; returns a short backend description.
    async fn ping(&self) -> Result<String, StoreError>;

    /// Backend name for logging and health output.
    fn name(&self) -> &str;
}

// ============================================================================
// PgRecordStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the underlying pool. Further inserts fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: &DetectionRecord) -> Result<(), StoreError> {
        record.validate()?;

        sqlx::query(
            r#"
            INSERT INTO detections (id, kind, data, is_authentic, confidence, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.kind.as_str())
        .bind(&record.data)
        .bind(record.is_authentic)
        .bind(record.confidence)
        .bind(&record.message)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %record.id, kind = %record.kind, "Detection record stored");
        Ok(())
    }

    async fn ping(&self) -> Result<String, StoreError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

// ============================================================================
// MemoryRecordStore
// ============================================================================

/// Keeps records in process memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<DetectionRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, in insertion order.
    pub fn records(&self) -> Vec<DetectionRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &DetectionRecord) -> Result<(), StoreError> {
        record.validate()?;
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<String, StoreError> {
        Ok(format!("memory ({} records)", self.len()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
