//! Service binary for sensorstream.
//!
//! Wires together configuration, logging, the sensor hub, and the HTTP
//! server, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `sensorstream.yaml` (or `SENSORSTREAM_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the sensor hub (generator + history)
//! 4. Start the shared ticker when `stream.mode` is `shared`
//! 5. Serve HTTP until `Ctrl-C`, then shut the hub down

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use sensorstream_core::{SensorConfig, SensorHub};
use sensorstream_observer::{AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerAppError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "sensorstream.yaml";

/// Environment variable selecting a different configuration file.
const CONFIG_PATH_ENV: &str = "SENSORSTREAM_CONFIG";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, hub construction, or the server
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember whether
    //    the file was found and report it afterwards.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("sensorstream-server starting");
    match &config_source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        tick_interval_ms = config.stream.tick_interval_ms,
        history_capacity = config.stream.history_capacity,
        mode = ?config.stream.mode,
        "Effective configuration"
    );

    // 3. Build the hub.
    let hub = Arc::new(SensorHub::from_config(&config).map_err(ServerAppError::from)?);
    info!(capacity = hub.capacity(), "Sensor hub initialized");

    // 4. Shared ticker, if configured.
    let ticker = hub.spawn_ticker();

    // 5. Serve until Ctrl-C.
    let state = Arc::new(
        AppState::new(Arc::clone(&hub))
            .with_keep_alive(config.stream.keep_alive()),
    );
    let server_config = ServerConfig::from(&config.server);
    sensorstream_observer::start_server(&server_config, state, shutdown_signal())
        .await
        .map_err(ServerAppError::from)?;

    hub.shutdown();
    if let Some(handle) = ticker {
        if let Err(e) = handle.await {
            warn!(error = %e, "Shared ticker task ended abnormally");
        }
    }

    info!("sensorstream-server shutdown complete");
    Ok(())
}

/// Load the configuration file, falling back to defaults when it does
/// not exist. Returns the path that was read, if any.
fn load_config() -> Result<(SensorConfig, Option<PathBuf>), ServerAppError> {
    let path = std::env::var_os(CONFIG_PATH_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        let config = SensorConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = SensorConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, None))
    }
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        return;
    }
    info!("Ctrl-C received, shutting down");
}
