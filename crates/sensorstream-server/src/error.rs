//! Error types for the server binary.
//!
//! [`ServerAppError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerAppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: sensorstream_core::ConfigError,
    },

    /// The hub rejected its configuration.
    #[error("hub error: {source}")]
    Hub {
        /// The underlying hub error.
        #[from]
        source: sensorstream_core::HubError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: sensorstream_observer::ServerError,
    },
}
