//! Bounded, append-only ring of recent readings.
//!
//! [`HistoryBuffer`] keeps the most recent `capacity` readings in arrival
//! order. Appending to a full buffer evicts the oldest entry first. The
//! buffer itself is not synchronized; [`SensorHub`](crate::hub::SensorHub)
//! wraps it together with the generator behind one mutex.

use std::collections::VecDeque;

use sensorstream_types::{HistorySnapshot, SensorReading};

/// Largest capacity a buffer accepts.
pub const MAX_HISTORY_CAPACITY: usize = 65_536;

/// Errors that can occur when building a history buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// A capacity of zero would hold nothing.
    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    /// The requested capacity exceeds [`MAX_HISTORY_CAPACITY`].
    #[error("history capacity {requested} exceeds the maximum of {max}")]
    CapacityTooLarge {
        /// Capacity that was asked for.
        requested: usize,
        /// Upper bound.
        max: usize,
    },
}

/// Fixed-capacity FIFO of readings, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    readings: VecDeque<SensorReading>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` readings.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::ZeroCapacity`] if `capacity` is 0, or
    /// [`HistoryError::CapacityTooLarge`] if it exceeds
    /// [`MAX_HISTORY_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        if capacity > MAX_HISTORY_CAPACITY {
            return Err(HistoryError::CapacityTooLarge {
                requested: capacity,
                max: MAX_HISTORY_CAPACITY,
            });
        }
        Ok(Self {
            readings: VecDeque::new(),
            capacity,
        })
    }

    /// Append a reading, returning the evicted oldest reading if the
    /// buffer was full.
    pub fn push(&mut self, reading: SensorReading) -> Option<SensorReading> {
        let evicted = if self.readings.len() >= self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    /// Maximum number of readings held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of readings currently held.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the buffer holds no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Whether the buffer holds `capacity` readings.
    pub fn is_full(&self) -> bool {
        self.readings.len() >= self.capacity
    }

    /// How many readings are missing from a full window.
    pub fn deficit(&self) -> usize {
        self.capacity.saturating_sub(self.readings.len())
    }

    /// Iterate readings, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SensorReading> {
        self.readings.iter()
    }

    /// Most recently appended reading.
    pub fn latest(&self) -> Option<&SensorReading> {
        self.readings.back()
    }

    /// Copy the readings out, oldest first.
    pub fn to_vec(&self) -> Vec<SensorReading> {
        self.readings.iter().cloned().collect()
    }

    /// Copy the readings out along with the derived parallel arrays.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::from_readings(self.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use chrono::Utc;
    use sensorstream_types::SensorStatus;

    use super::*;

    fn reading(n: usize) -> SensorReading {
        SensorReading::new(Utc::now(), n as f64, 50.0, SensorStatus::Normal)
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(HistoryBuffer::new(0).err(), Some(HistoryError::ZeroCapacity));
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        assert_eq!(
            HistoryBuffer::new(usize::MAX).err(),
            Some(HistoryError::CapacityTooLarge {
                requested: usize::MAX,
                max: MAX_HISTORY_CAPACITY,
            })
        );
        let buffer = HistoryBuffer::new(MAX_HISTORY_CAPACITY).unwrap();
        assert_eq!(buffer.capacity(), MAX_HISTORY_CAPACITY);
        assert!(buffer.is_empty());
    }

    #[test]
    fn push_below_capacity_evicts_nothing() {
        let mut buffer = HistoryBuffer::new(3).unwrap();
        assert!(buffer.push(reading(1)).is_none());
        assert!(buffer.push(reading(2)).is_none());
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.deficit(), 1);
        assert!(!buffer.is_full());
    }

    #[test]
    fn overflow_keeps_last_readings_in_arrival_order() {
        let mut buffer = HistoryBuffer::new(4).unwrap();
        for n in 0..11 {
            buffer.push(reading(n));
        }
        assert_eq!(buffer.len(), 4);
        let temps: Vec<f64> = buffer.iter().map(SensorReading::temperature).collect();
        assert_eq!(temps, vec![7.0, 8.0, 9.0, 10.0]);
        assert_eq!(buffer.latest().map(SensorReading::temperature), Some(10.0));
    }

    #[test]
    fn eviction_returns_oldest_first() {
        let mut buffer = HistoryBuffer::new(2).unwrap();
        buffer.push(reading(1));
        buffer.push(reading(2));
        let evicted = buffer.push(reading(3)).map(|r| r.temperature());
        assert_eq!(evicted, Some(1.0));
        let evicted = buffer.push(reading(4)).map(|r| r.temperature());
        assert_eq!(evicted, Some(2.0));
    }

    #[test]
    fn snapshot_labels_follow_positions() {
        let mut buffer = HistoryBuffer::new(3).unwrap();
        for n in 0..5 {
            buffer.push(reading(n));
        }
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.temperatures, vec![2.0, 3.0, 4.0]);
        assert_eq!(snapshot.labels, vec!["0", "1", "2"]);
        assert!(buffer.is_full());
        assert_eq!(buffer.deficit(), 0);
    }
}
