pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod startup;
pub mod store;

pub use config::TruthGuardConfig;
pub use error::TruthGuardError;
pub use gateway::{
    create_gateway, GatewayError, HttpModelGateway, MediaClassification, ModelGateway,
    NewsClassification, StubGateway,
};
pub use models::{DetectionKind, DetectionRecord, ValidationError};
pub use store::{MemoryRecordStore, PgRecordStore, RecordStore, StoreError};
