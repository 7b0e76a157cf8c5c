//! Jellyfish box server.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$JELLYBOX_CONFIG` or `jellybox-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Import the species and event catalogue, if configured
//! 5. Serve the HTTP API until `Ctrl-C`

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jellybox_api::{AppState, ServerConfig};
use jellybox_core::{BoxService, JellyboxConfig};
use jellybox_db::{PgBoxRepository, PostgresConfig, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerAppError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "jellybox-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server stops
/// abnormally.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration.
    let (config, config_path) = load_config()?;

    // 2. Logging. RUST_LOG wins over the configured level.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level).map_err(|e| {
            ServerAppError::Logging {
                message: format!("invalid logging.level {:?}: {e}", config.logging.level),
            }
        })?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        config = %config_path.display(),
        capacity = config.box_settings.capacity,
        cooldown_hours = config.catch.cooldown_hours,
        "jellybox-server starting"
    );

    // 3. Storage.
    let pool = PostgresPool::connect(&PostgresConfig::from_infrastructure(
        &config.infrastructure,
    ))
    .await
    .map_err(ServerAppError::from)?;
    pool.run_migrations().await.map_err(ServerAppError::from)?;
    info!("database ready");

    // 4. Catalogue.
    if let Some(path) = &config.catalogue.path {
        let summary = jellybox_db::import_catalogue(&pool, path)
            .await
            .map_err(ServerAppError::from)?;
        info!(
            species = summary.species,
            events = summary.events,
            pruned_boxes = summary.pruned_boxes,
            "catalogue imported"
        );
    } else {
        info!("no catalogue path configured, keeping stored catalogue");
    }

    // 5. Serve.
    let server_config = ServerConfig::from_infrastructure(&config.infrastructure);
    let service = BoxService::new(PgBoxRepository::new(pool.clone()), config);
    let result = jellybox_api::start_server(&server_config, Arc::new(AppState::new(service))).await;

    pool.close().await;
    result.map_err(ServerAppError::from)?;

    info!("jellybox-server shutdown complete");
    Ok(())
}

/// Load configuration from `$JELLYBOX_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_PATH`]. A missing default file means built-in
/// defaults; a missing explicit file is an error.
fn load_config() -> Result<(JellyboxConfig, PathBuf), ServerAppError> {
    if let Ok(explicit) = std::env::var("JELLYBOX_CONFIG") {
        let path = PathBuf::from(explicit);
        let config = JellyboxConfig::from_file(&path)?;
        return Ok((config, path));
    }

    let path = Path::new(DEFAULT_CONFIG_PATH).to_path_buf();
    if path.exists() {
        let config = JellyboxConfig::from_file(&path)?;
        Ok((config, path))
    } else {
        Ok((JellyboxConfig::parse("")?, path))
    }
}
