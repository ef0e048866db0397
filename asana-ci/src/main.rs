//! asana-ci - Content Import microservice
//!
//! Validates CSV pose imports and drives bulk asset uploads for the admin console,
//! handing accepted work to the persistence collaborator.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use asana_common::config::{config_file_path, load_toml_config, RootFolderInitializer, TomlConfig};
use asana_common::events::EventBus;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asana_ci::config::{ServiceConfig, DEFAULT_PORT};
use asana_ci::services::{HttpCollaborator, PreviewStore};
use asana_ci::AppState;

/// Command-line arguments for asana-ci
#[derive(Parser, Debug)]
#[command(name = "asana-ci")]
#[command(about = "Content import microservice for the Asana pose library")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "ASANA_CI_PORT")]
    port: u16,

    /// Root folder holding the history database and preview files
    #[arg(short, long, env = "ASANA_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Base URL of the persistence collaborator
    #[arg(long, env = "ASANA_COLLABORATOR_URL")]
    collaborator_url: Option<String>,

    /// TOML config file (defaults to <config dir>/asana/asana-ci.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = match args.config.clone().or_else(|| config_file_path("asana-ci")) {
        Some(path) => load_toml_config(&path).context("Failed to load config file")?,
        None => TomlConfig::default(),
    };

    let default_filter = format!("asana_ci={0},tower_http={0}", toml_config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting asana-ci (Content Import) microservice");
    info!(
        "Version: {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let config = ServiceConfig::resolve(
        args.port,
        args.root_folder.as_deref(),
        args.collaborator_url.as_deref(),
        &toml_config,
    );

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = asana_ci::db::init_database_pool(&db_path).await?;

    let closed = asana_ci::db::batches::close_stale_batches(&db_pool).await?;
    if closed > 0 {
        warn!("Closed {} upload batch(es) left open by a previous run", closed);
    }

    let collaborator = HttpCollaborator::new(&config.collaborator_url, config.request_timeout)
        .context("Failed to build collaborator client")?;
    info!("Collaborator: {}", collaborator.base_url());

    let event_bus = EventBus::new(100);
    let state = AppState::new(
        db_pool,
        event_bus,
        Arc::new(collaborator),
        PreviewStore::new(initializer.previews_dir()),
    );

    let app = asana_ci::build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
