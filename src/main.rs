use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use secure_data_api::app::{app, AppState};
use secure_data_api::clock;
use secure_data_api::config::config;
use secure_data_api::database::{seed_admin, MemoryDatabase};

#[derive(Parser, Debug)]
#[command(name = "secure-data-api", version, about = "Secure data API server")]
struct Args {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, APP_ENV, etc.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Secure Data API in {:?} mode", config.environment);

    let state = AppState::new(config.clone(), Arc::new(MemoryDatabase::new()), clock::system())?;
    seed_admin(state.db.as_ref(), &state.credentials, &config.bootstrap)
        .await
        .context("admin bootstrap failed")?;

    let _sweeper = state
        .limiter
        .spawn_sweeper(std::time::Duration::from_secs(config.api.rate_limit_sweep_secs.max(1)));

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Secure Data API listening on http://{}", bind_addr);

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}
