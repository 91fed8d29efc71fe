//! Shared application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use sensorstream_core::SensorHub;

/// Default interval between SSE keep-alive comments.
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The hub
/// is the only owner of the history window; handlers borrow it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The hub driving ticks and owning the history.
    pub hub: Arc<SensorHub>,
    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
}

impl AppState {
    /// Create application state around a hub.
    pub const fn new(hub: Arc<SensorHub>) -> Self {
        Self {
            hub,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Override the SSE keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
