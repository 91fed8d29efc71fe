//! HTTP server for the sensorstream service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Server-sent events endpoint** (`/stream`) pushing a
//!   `sensor_update` event per tick
//! - **REST endpoints** for the primed history window (`/chart-data`), a
//!   one-off reading (`/current`), and service status (`/api/status`)
//! - **Minimal HTML page** (`GET /`) linking the endpoints
//!
//! # Architecture
//!
//! Handlers hold no state of their own. Every request goes through the
//! shared [`SensorHub`], which owns the reading cadence and the history
//! window; this crate only frames what the hub produces.
//!
//! [`SensorHub`]: sensorstream_core::SensorHub

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sse;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
