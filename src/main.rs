//! Almanac Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use almanac::{create_router, create_store, ApiState, Authenticator, Config, ReminderWorker, RestApiConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Almanac: Personal Calendar Server
#[derive(Parser, Debug)]
#[command(name = "almanac")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Persist store contents under this directory
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.persist = true;
        config.storage.data_dir = data_dir;
    }

    // A missing JWT secret is the one startup failure that halts the process
    let authenticator = Arc::new(Authenticator::new(&config.auth)?);
    let store = create_store(&config).await?;

    if config.worker.enabled {
        let worker = ReminderWorker::new(
            store.clone(),
            Duration::from_secs(config.worker.poll_interval_secs),
        );
        tokio::spawn(worker.run());
    } else {
        tracing::warn!("Reminder worker disabled; reminders will not be dispatched");
    }

    let state = ApiState::new(store, authenticator, &config);
    let app = create_router(state, &RestApiConfig::default());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Almanac listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}
