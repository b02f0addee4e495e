use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum TruthGuardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
