pub mod detection;

pub use detection::{DetectionKind, DetectionRecord, ValidationError};
