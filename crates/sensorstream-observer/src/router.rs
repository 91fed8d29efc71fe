//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::sse;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /stream` -- `sensor_update` server-sent events
/// - `GET /chart-data` -- primed history window
/// - `GET /current` -- one fresh reading
/// - `GET /api/status` -- hub status
///
/// Unknown paths get a JSON 404. CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/stream", get(sse::stream))
        .route("/chart-data", get(handlers::chart_data))
        .route("/current", get(handlers::current))
        .route("/api/status", get(handlers::status))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
