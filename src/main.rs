//! lingua-link - Language Exchange Backend
//!
//! Serves the REST API for the language-exchange frontend: auth, social
//! graph, chat token issuance, payments, and the AI speech-practice
//! pipeline.

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lingua_link::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting lingua-link backend");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let port = config.port;

    // Open or create the database
    let db_path = PathBuf::from(&config.db_path);
    info!("Database: {}", db_path.display());
    let db_pool = lingua_link::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Provider clients are built once and shared read-only
    let state = AppState::from_config(db_pool, config)?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on http://0.0.0.0:{}", port);
    info!("Health check: http://0.0.0.0:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
