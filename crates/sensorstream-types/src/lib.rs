//! Shared type definitions for the sensorstream service.
//!
//! This crate is the single source of truth for the values that travel
//! over the wire. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for streaming session identifiers
//! - [`enums`] -- Sensor status enumeration
//! - [`structs`] -- Readings and the derived history snapshot

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::SensorStatus;
pub use ids::SessionId;
pub use structs::{HistorySnapshot, SensorReading};
