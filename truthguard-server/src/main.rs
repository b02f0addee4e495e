use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};
use truthguard_core::{startup, ModelGateway, TruthGuardConfig};

use truthguard_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "truthguard.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match TruthGuardConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    if args.health {
        let pool = match truthguard_core::db::create_pool(&config.database).await {
            Ok(p) => p,
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        };
        match truthguard_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL health query failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("✅ TruthGuard DB health check passed");
        return Ok(());
    }

    let components = match startup::init(&config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to start TruthGuard: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(components.store);
    let gateway: Arc<dyn ModelGateway> = Arc::from(components.gateway);
    tracing::info!(
        gateway = gateway.name(),
        base_url = %config.gateway.base_url,
        timeout_seconds = config.gateway.timeout_seconds,
        "Model gateway ready"
    );

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = Arc::new(
        HttpState::new(gateway, store.clone()).with_body_limit(config.http.body_limit_bytes),
    );
    http::start_http_server(&config.http, state, tx.subscribe()).await?;

    store.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}
