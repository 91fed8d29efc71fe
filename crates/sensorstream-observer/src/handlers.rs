//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/chart-data` | Primed history window with parallel arrays |
//! | `GET` | `/current` | One fresh reading, not stored |
//! | `GET` | `/api/status` | Hub status |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse};
use sensorstream_core::BroadcastMode;
use sensorstream_types::{HistorySnapshot, SensorReading};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing hub status and endpoint links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let history_len = state.hub.history_len().await;
    let capacity = state.hub.capacity();
    let sessions = state.hub.active_sessions();
    let interval_secs = state.hub.tick_interval().as_secs_f64();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Sensorstream</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Sensorstream</h1>
    <div>
        <div class="metric"><div class="label">History</div><div class="value">{history_len}/{capacity}</div></div>
        <div class="metric"><div class="label">Sessions</div><div class="value">{sessions}</div></div>
        <div class="metric"><div class="label">Tick (s)</div><div class="value">{interval_secs}</div></div>
    </div>
    <h2>Endpoints</h2>
    <ul>
        <li><a href="/stream">/stream</a> -- sensor_update event stream</li>
        <li><a href="/chart-data">/chart-data</a> -- Recent readings for charts</li>
        <li><a href="/current">/current</a> -- One fresh reading</li>
        <li><a href="/api/status">/api/status</a> -- Hub status</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /chart-data
// ---------------------------------------------------------------------------

/// Return the history window, priming it to full capacity first.
pub async fn chart_data(State(state): State<Arc<AppState>>) -> Json<HistorySnapshot> {
    Json(state.hub.snapshot().await)
}

// ---------------------------------------------------------------------------
// GET /current
// ---------------------------------------------------------------------------

/// Return one freshly generated reading. The history is not touched.
pub async fn current(State(state): State<Arc<AppState>>) -> Json<SensorReading> {
    Json(state.hub.current().await)
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Hub status returned by `GET /api/status`.
#[derive(Debug, serde::Serialize)]
pub struct StatusResponse {
    /// Maximum readings kept in the history.
    pub history_capacity: usize,
    /// Readings currently held.
    pub history_len: usize,
    /// Open streaming sessions.
    pub active_sessions: usize,
    /// Milliseconds between ticks.
    pub tick_interval_ms: u64,
    /// Tick sharing mode.
    pub mode: BroadcastMode,
}

/// Report history fill, open sessions and cadence.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let hub = &state.hub;
    Json(StatusResponse {
        history_capacity: hub.capacity(),
        history_len: hub.history_len().await,
        active_sessions: hub.active_sessions(),
        tick_interval_ms: u64::try_from(hub.tick_interval().as_millis()).unwrap_or(u64::MAX),
        mode: hub.mode(),
    })
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// JSON 404 for unknown routes.
pub async fn not_found(uri: Uri) -> ObserverError {
    ObserverError::NotFound(uri.path().to_owned())
}
