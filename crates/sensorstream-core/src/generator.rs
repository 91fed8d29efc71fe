//! Synthetic sensor reading source.
//!
//! [`ReadingGenerator`] produces one [`SensorReading`] per call. It keeps
//! no history: callers decide where readings go. The random source is
//! injectable so tests can pin exact sequences with a seed.
//!
//! Values are drawn uniformly over the one-decimal values ("tenths")
//! contained in each configured closed range. Drawing tenths directly
//! means a generated value is always inside its range and always has
//! exactly one decimal place.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sensorstream_types::{SensorReading, SensorStatus};

use crate::config::GeneratorConfig;

/// Scale factor between a value and its count of tenths.
const TENTHS: f64 = 10.0;

/// Errors that can occur when building a generator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    /// A configured range is inverted, degenerate, not finite, or holds
    /// no one-decimal value.
    #[error("invalid {quantity} range [{min}, {max}]: {reason}")]
    InvalidRange {
        /// Which quantity the range applies to (`temperature` or `humidity`).
        quantity: &'static str,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
        /// Explanation of what is wrong with the range.
        reason: &'static str,
    },
}

/// A closed range expressed as integer counts of tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TenthsRange {
    lo: i64,
    hi: i64,
}

impl TenthsRange {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn new(quantity: &'static str, min: f64, max: f64) -> Result<Self, GeneratorError> {
        let invalid = |reason| GeneratorError::InvalidRange {
            quantity,
            min,
            max,
            reason,
        };

        if !min.is_finite() || !max.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if min >= max {
            return Err(invalid("min must be strictly below max"));
        }

        // Round to the nearest tenth, then step inwards if rounding left
        // the closed range.
        let mut lo = (min * TENTHS).round() as i64;
        if (lo as f64) / TENTHS < min {
            lo = lo.saturating_add(1);
        }
        let mut hi = (max * TENTHS).round() as i64;
        if (hi as f64) / TENTHS > max {
            hi = hi.saturating_sub(1);
        }

        if lo > hi {
            return Err(invalid("range contains no one-decimal value"));
        }
        Ok(Self { lo, hi })
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(self, rng: &mut impl Rng) -> f64 {
        let tenths = rng.random_range(self.lo..=self.hi);
        (tenths as f64) / TENTHS
    }
}

/// Source of synthetic readings.
///
/// Ranges are validated once at construction; [`generate`](Self::generate)
/// itself cannot fail. Timestamps come from the configured clock and are
/// clamped so they never go backwards between successive readings.
#[derive(Debug)]
pub struct ReadingGenerator {
    temperature: TenthsRange,
    humidity: TenthsRange,
    rng: StdRng,
    clock: fn() -> DateTime<Utc>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl ReadingGenerator {
    /// Build a generator from configuration.
    ///
    /// Uses `config.seed` when set, otherwise seeds from the operating
    /// system.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidRange`] if either range is invalid.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_rng(config, rng)
    }

    /// Build a generator with a fixed seed, ignoring `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidRange`] if either range is invalid.
    pub fn seeded(config: &GeneratorConfig, seed: u64) -> Result<Self, GeneratorError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Build a generator around an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidRange`] if either range is invalid.
    pub fn with_rng(config: &GeneratorConfig, rng: StdRng) -> Result<Self, GeneratorError> {
        let temperature = TenthsRange::new("temperature", config.min_temp, config.max_temp)?;
        let humidity = TenthsRange::new("humidity", config.min_humidity, config.max_humidity)?;
        Ok(Self {
            temperature,
            humidity,
            rng,
            clock: Utc::now,
            last_timestamp: None,
        })
    }

    /// Replace the timestamp source (defaults to [`Utc::now`]).
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Produce one reading.
    pub fn generate(&mut self) -> SensorReading {
        let now = (self.clock)();
        let timestamp = self.last_timestamp.map_or(now, |last| last.max(now));
        self.last_timestamp = Some(timestamp);

        let temperature = self.temperature.sample(&mut self.rng);
        let humidity = self.humidity.sample(&mut self.rng);
        let status = match self.rng.random_range(0..SensorStatus::ALL.len()) {
            0 => SensorStatus::Normal,
            1 => SensorStatus::Warning,
            _ => SensorStatus::Critical,
        };

        SensorReading::new(timestamp, temperature, humidity, status)
    }
}
