//! Reading generator, bounded history, and stream broadcaster for the
//! sensorstream service.
//!
//! This crate owns the reading cadence and the shared history window.
//! The HTTP layer only frames what this crate produces.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `sensorstream.yaml` into
//!   strongly-typed structs.
//! - [`generator`] -- [`ReadingGenerator`], the synthetic reading source.
//! - [`history`] -- [`HistoryBuffer`], the bounded ring of recent readings.
//! - [`hub`] -- [`SensorHub`], which drives ticks, owns the history, and
//!   hands out sessions.
//! - [`session`] -- [`SensorSession`], one subscriber's cancellable event
//!   stream.
//!
//! [`ReadingGenerator`]: generator::ReadingGenerator
//! [`HistoryBuffer`]: history::HistoryBuffer
//! [`SensorHub`]: hub::SensorHub
//! [`SensorSession`]: session::SensorSession

pub mod config;
pub mod generator;
pub mod history;
pub mod hub;
pub mod session;

pub use config::{BroadcastMode, ConfigError, SensorConfig};
pub use generator::{GeneratorError, ReadingGenerator};
pub use history::{HistoryBuffer, HistoryError, MAX_HISTORY_CAPACITY};
pub use hub::{HubError, SensorHub};
pub use session::{CloseReason, SENSOR_UPDATE, SensorEvent, SensorSession, SessionState};
