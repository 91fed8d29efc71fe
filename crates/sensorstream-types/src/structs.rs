//! Reading and history structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::SensorStatus;

// ---------------------------------------------------------------------------
// SensorReading
// ---------------------------------------------------------------------------

/// One synthetic sensor sample.
///
/// Readings are immutable once built: fields are private and only
/// exposed through accessors. The serialized field names (`timestamp`,
/// `temperature`, `humidity`, `status`) are the wire contract consumed by
/// the dashboard and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SensorReading {
    timestamp: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    status: SensorStatus,
}

impl SensorReading {
    /// Build a reading from its parts.
    pub const fn new(
        timestamp: DateTime<Utc>,
        temperature: f64,
        humidity: f64,
        status: SensorStatus,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            status,
        }
    }

    /// Instant the reading was generated.
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Temperature in degrees Celsius, one decimal place.
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Relative humidity in percent, one decimal place.
    pub const fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Reported sensor status.
    pub const fn status(&self) -> SensorStatus {
        self.status
    }
}

// ---------------------------------------------------------------------------
// HistorySnapshot
// ---------------------------------------------------------------------------

/// Ordered copy of the history buffer plus chart-friendly parallel arrays.
///
/// `temperatures`, `humidities` and `labels` are aligned by position with
/// `readings`; `labels` holds the positional index of each entry as a
/// string (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistorySnapshot {
    /// Readings, oldest first.
    pub readings: Vec<SensorReading>,
    /// Temperature of each reading.
    pub temperatures: Vec<f64>,
    /// Humidity of each reading.
    pub humidities: Vec<f64>,
    /// Positional index labels.
    pub labels: Vec<String>,
}

impl HistorySnapshot {
    /// Derive the parallel arrays from an ordered list of readings.
    pub fn from_readings(readings: Vec<SensorReading>) -> Self {
        let temperatures = readings.iter().map(SensorReading::temperature).collect();
        let humidities = readings.iter().map(SensorReading::humidity).collect();
        let labels = (0..readings.len()).map(|i| i.to_string()).collect();
        Self {
            readings,
            temperatures,
            humidities,
            labels,
        }
    }

    /// Number of readings in the snapshot.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the snapshot holds no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
