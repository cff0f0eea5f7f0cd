//! bookclub-server - Book club microservice
//!
//! **Module Identity:**
//! - Name: bookclub-server
//! - Default port: 5730
//!
//! Serves book recommendations, discussion questions and meeting scheduling
//! over HTTP, backed by a SQLite database in the root folder.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookclub_common::config::{
    load_toml_config_or_default, resolve_port, RootFolderInitializer, RootFolderResolver,
};
use bookclub_server::config::{resolve_naver_credentials, resolve_openai_api_key};
use bookclub_server::services::{NaverBookClient, OpenAiClient};
use bookclub_server::AppState;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODULE_NAME: &str = "bookclub-server";

/// Command-line arguments for bookclub-server
#[derive(Parser, Debug)]
#[command(name = "bookclub-server")]
#[command(about = "Book club recommendation and meeting service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides BOOKCLUB_PORT and the TOML config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Root folder holding the database (overrides BOOKCLUB_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config dir>/bookclub/bookclub-server.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_toml_config_or_default(args.config.as_deref(), MODULE_NAME);

    // RUST_LOG wins over the TOML level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "bookclub_server={level},bookclub_common={level},tower_http=info",
            level = toml_config.logging.level
        )
        .into()
    });

    let file_layer = match &toml_config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    info!(
        "Starting {} v{} [{}] built {} ({})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Root folder and database
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_override(args.root_folder)
        .with_toml_value(toml_config.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = bookclub_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    // External services; missing credentials degrade rather than abort
    let openai_key = resolve_openai_api_key(&toml_config)
        .map_err(|e| warn!("{} - recommendations will rely on stored books", e))
        .ok();
    let naver_credentials = resolve_naver_credentials(&toml_config)
        .map_err(|e| warn!("{} - book search disabled", e))
        .ok();

    let generator = OpenAiClient::new(&toml_config.openai, openai_key)
        .context("Failed to build generator client")?;
    let search = NaverBookClient::new(&toml_config.naver, naver_credentials)
        .context("Failed to build book search client")?;

    let state = AppState::new(db_pool, Arc::new(generator), Arc::new(search));
    let app = bookclub_server::build_router(state);

    let port = resolve_port(args.port, &toml_config);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
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

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
