use crate::config::TruthGuardConfig;
use crate::error::TruthGuardError;
use crate::gateway::{create_gateway, ModelGateway};
use crate::store::PgRecordStore;

/// Everything a running server needs, built from config.
pub struct Components {
    pub store: PgRecordStore,
    pub gateway: Box<dyn ModelGateway>,
}

/// Connect to Postgres, apply the schema and build the configured gateway.
/// The gateway is built first so a bad gateway config fails without touching
/// the database.
pub async fn init(config: &TruthGuardConfig) -> Result<Components, TruthGuardError> {
    let gateway = create_gateway(&config.gateway)?;

    let pool = crate::db::create_pool(&config.database).await?;
    crate::db::run_migrations(&pool).await?;

    Ok(Components {
        store: PgRecordStore::new(pool),
        gateway,
    })
}
