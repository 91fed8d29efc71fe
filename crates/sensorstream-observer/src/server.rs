//! HTTP server lifecycle management.
//!
//! Provides [`start_server`] which binds to a TCP port and runs the Axum
//! server until the provided shutdown signal resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use sensorstream_core::config::HttpConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for ServerConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

impl ServerConfig {
    /// Parse the configured host and port into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))
    }
}

/// Start the HTTP server.
///
/// Binds to the configured address, builds the router, and serves
/// requests until `shutdown` resolves. On shutdown the hub is shut down
/// first so open event streams end and the graceful drain can finish.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;

    let hub = Arc::clone(&state.hub);
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Sensorstream server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            hub.shutdown();
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Sensorstream server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let addr = ServerConfig::default().socket_addr();
        assert_eq!(addr.ok().map(|a| a.port()), Some(8000));
    }

    #[test]
    fn invalid_host_is_a_bind_error() {
        let config = ServerConfig {
            host: "not a host".to_owned(),
            port: 8000,
        };
        assert!(matches!(config.socket_addr(), Err(ServerError::Bind(_))));
    }
}
