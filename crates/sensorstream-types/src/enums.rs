//! Enumeration types carried on the wire.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Operating status reported alongside each reading.
///
/// The status is drawn independently of temperature and humidity; a
/// `critical` reading can carry perfectly ordinary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SensorStatus {
    /// Sensor operating normally.
    Normal,
    /// Sensor reports a condition worth looking at.
    Warning,
    /// Sensor reports a condition requiring attention.
    Critical,
}

impl SensorStatus {
    /// Every status value, in declaration order.
    pub const ALL: [Self; 3] = [Self::Normal, Self::Warning, Self::Critical];

    /// The wire name of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl core::fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
