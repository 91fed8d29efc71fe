//! Server-sent events handler for real-time reading streaming.
//!
//! Clients connect to `GET /stream` and receive one `sensor_update`
//! event per tick whose data is the JSON-encoded reading. Each connection
//! opens its own [`SensorSession`]; when the client disconnects, Axum
//! drops the response stream, which drops and closes the session.
//!
//! [`SensorSession`]: sensorstream_core::SensorSession

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::state::AppState;

/// Open a streaming session and frame its events as SSE.
///
/// # Route
///
/// `GET /stream`
pub async fn stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.hub.subscribe();
    let session_id = session.id();
    debug!(session = %session_id, "SSE client connected");

    let events = session.filter_map(move |event| async move {
        match event.payload() {
            Ok(json) => Some(Ok::<_, Infallible>(Event::default().event(event.kind()).data(json))),
            Err(e) => {
                warn!(session = %session_id, "Failed to serialize sensor reading: {e}");
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}
