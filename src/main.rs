//! # PGH NextBus
//!
//! Serves realtime arrival predictions, vehicle positions and stop search for
//! Port Authority of Allegheny County buses, and generates the stop database
//! the service answers from.

mod config;
mod generate;
mod http;
mod provider;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nextbus::{NextBus, QuotaBreaker};
use stops::StopDatabase;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::AppConfig;
use crate::http::AppState;
use crate::provider::Provider;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "pgh-nextbus", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve,

    /// Build the stop database from the upstream API.
    Generate {
        /// File the database is written to.
        #[arg(short, long, default_value = "stops.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_env()?);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Generate { output } => {
            let provider = Provider::new(config, StopDatabase::default())?;
            let database = generate::build(&provider).await.context("generating stop database")?;
            database.save(&output)?;
            info!(path = %output.display(), "stop database written");
            Ok(())
        }
    }
}

async fn serve(config: Arc<AppConfig>) -> Result<()> {
    let database = StopDatabase::load(&config.stop_db)?;
    let provider = Provider::new(Arc::clone(&config), database)?;

    let purged = provider.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = purged.store().purge();
            debug!(removed, "purged expired cache entries");
        }
    });

    let service = NextBus::new(provider, Arc::new(QuotaBreaker::new()), config.settings.clone());
    let state = AppState::new(service, config.app_key.clone(), config.operator_key.clone());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, http::router(state)).with_graceful_shutdown(shutdown()).await?;
    Ok(())
}

async fn shutdown() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
