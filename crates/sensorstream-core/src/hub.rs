//! Stream broadcaster and owner of the shared history.
//!
//! [`SensorHub`] is created once at startup and shared via [`Arc`] with
//! every session and every HTTP handler. The generator and the history
//! buffer sit behind a single [`tokio::sync::Mutex`], and each tick or
//! priming pass is one critical section: generate, append, release. Ring
//! order, timestamp order and the capacity bound therefore hold no matter
//! how many sessions tick at once.
//!
//! # Broadcast modes
//!
//! - [`BroadcastMode::PerSession`]: each [`SensorSession`] drives its own
//!   interval and appends its own readings.
//! - [`BroadcastMode::Shared`]: [`SensorHub::spawn_ticker`] runs one
//!   interval for the whole process and fans each reading out over a
//!   [`broadcast`] channel. Ticks with no subscriber attached are skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sensorstream_types::{HistorySnapshot, SensorReading};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{BroadcastMode, SensorConfig};
use crate::generator::{GeneratorError, ReadingGenerator};
use crate::history::{HistoryBuffer, HistoryError};
use crate::session::SensorSession;

/// Capacity of the shared-mode broadcast channel.
///
/// A subscriber that falls behind by more than this many readings skips
/// ahead to the oldest reading still buffered.
pub const SHARED_CHANNEL_CAPACITY: usize = 64;

/// Errors that can occur when building a hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The generator configuration was rejected.
    #[error("generator error: {source}")]
    Generator {
        /// The underlying generator error.
        #[from]
        source: GeneratorError,
    },

    /// The history configuration was rejected.
    #[error("history error: {source}")]
    History {
        /// The underlying history error.
        #[from]
        source: HistoryError,
    },

    /// A zero tick interval would spin.
    #[error("tick interval must be greater than zero")]
    InvalidInterval,
}

#[derive(Debug)]
struct HubInner {
    generator: ReadingGenerator,
    history: HistoryBuffer,
}

/// Periodic-broadcast hub with a bounded shared history.
#[derive(Debug)]
pub struct SensorHub {
    inner: Mutex<HubInner>,
    capacity: usize,
    tick_interval: Duration,
    mode: BroadcastMode,
    shared_tx: broadcast::Sender<SensorReading>,
    shutdown: CancellationToken,
    active_sessions: AtomicUsize,
}

impl SensorHub {
    /// Assemble a hub from an already-built generator and history buffer.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidInterval`] if `tick_interval` is zero.
    pub fn new(
        generator: ReadingGenerator,
        history: HistoryBuffer,
        tick_interval: Duration,
        mode: BroadcastMode,
    ) -> Result<Self, HubError> {
        if tick_interval.is_zero() {
            return Err(HubError::InvalidInterval);
        }
        let (shared_tx, _) = broadcast::channel(SHARED_CHANNEL_CAPACITY);
        Ok(Self {
            capacity: history.capacity(),
            inner: Mutex::new(HubInner { generator, history }),
            tick_interval,
            mode,
            shared_tx,
            shutdown: CancellationToken::new(),
            active_sessions: AtomicUsize::new(0),
        })
    }

    /// Build a hub, its generator and its history from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HubError`] if any configured range, the history capacity,
    /// or the tick interval is invalid.
    pub fn from_config(config: &SensorConfig) -> Result<Self, HubError> {
        let generator = ReadingGenerator::from_config(&config.generator)?;
        let history = HistoryBuffer::new(config.stream.history_capacity)?;
        Self::new(
            generator,
            history,
            Duration::from_millis(config.stream.tick_interval_ms),
            config.stream.mode,
        )
    }

    // -----------------------------------------------------------------------
    // Readings and history
    // -----------------------------------------------------------------------

    /// Run one tick: generate a reading and append it to the history,
    /// evicting the oldest entry if the window is full.
    pub async fn record_tick(&self) -> SensorReading {
        let mut inner = self.inner.lock().await;
        let reading = inner.generator.generate();
        if inner.history.push(reading.clone()).is_some() {
            debug!("history full, oldest reading evicted");
        }
        reading
    }

    /// Return the ordered history plus its derived parallel arrays.
    ///
    /// If the history holds fewer than [`capacity`](Self::capacity)
    /// readings it is first topped up with fresh ones. Priming runs under
    /// the hub lock, so concurrent callers never overfill the window.
    pub async fn snapshot(&self) -> HistorySnapshot {
        let mut inner = self.inner.lock().await;
        let HubInner { generator, history } = &mut *inner;

        let deficit = history.deficit();
        if deficit > 0 {
            for _ in 0..deficit {
                history.push(generator.generate());
            }
            debug!(primed = deficit, "history primed to full window");
        }

        history.snapshot()
    }

    /// Generate a reading without storing it.
    pub async fn current(&self) -> SensorReading {
        self.inner.lock().await.generator.generate()
    }

    /// Copy of the history as it stands, without priming.
    pub async fn history(&self) -> Vec<SensorReading> {
        self.inner.lock().await.history.to_vec()
    }

    /// Number of readings currently held, without priming.
    pub async fn history_len(&self) -> usize {
        self.inner.lock().await.history.len()
    }

    /// Maximum number of readings kept in the history.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time between ticks.
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// How ticks are shared between subscribers.
    pub const fn mode(&self) -> BroadcastMode {
        self.mode
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Open a new streaming session.
    ///
    /// The session is cancelled when [`SensorSession::cancel`] is called,
    /// when the hub shuts down, or when the session is dropped.
    pub fn subscribe(self: &Arc<Self>) -> SensorSession {
        let source = match self.mode {
            BroadcastMode::PerSession => None,
            BroadcastMode::Shared => Some(self.shared_tx.subscribe()),
        };
        let active = self
            .active_sessions
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1);
        let session = SensorSession::open(Arc::clone(self), self.shutdown.child_token(), source);
        debug!(session = %session.id(), active, mode = ?self.mode, "session opened");
        session
    }

    /// Number of sessions that have been opened and not yet dropped.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Acquire)
    }

    pub(crate) fn session_closed(&self) -> usize {
        self.active_sessions
            .fetch_sub(1, Ordering::AcqRel)
            .saturating_sub(1)
    }

    // -----------------------------------------------------------------------
    // Shared ticker and shutdown
    // -----------------------------------------------------------------------

    /// Spawn the shared-mode ticker on a background task.
    ///
    /// Returns `None` in [`BroadcastMode::PerSession`], where sessions
    /// tick on their own. The task runs until [`shutdown`](Self::shutdown).
    pub fn spawn_ticker(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.mode != BroadcastMode::Shared {
            return None;
        }
        let hub = Arc::clone(self);
        Some(tokio::spawn(async move { hub.run_ticker().await }))
    }

    async fn run_ticker(&self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick_interval = ?self.tick_interval, "Shared ticker started");

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    info!("Shared ticker stopped");
                    return;
                }
                _ = interval.tick() => {}
            }

            if self.shared_tx.receiver_count() == 0 {
                continue;
            }

            let reading = self.record_tick().await;
            // send fails only when every receiver dropped since the check.
            let receivers = self.shared_tx.send(reading).unwrap_or(0);
            debug!(receivers, "Shared tick broadcast sent");
        }
    }

    /// Cancel every open session and stop the shared ticker.
    pub fn shutdown(&self) {
        info!(active_sessions = self.active_sessions(), "Sensor hub shutting down");
        self.shutdown.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::GeneratorConfig;

    use super::*;

    fn hub(capacity: usize) -> SensorHub {
        let generator = ReadingGenerator::seeded(&GeneratorConfig::default(), 11).unwrap();
        SensorHub::new(
            generator,
            HistoryBuffer::new(capacity).unwrap(),
            Duration::from_secs(1),
            BroadcastMode::PerSession,
        )
        .unwrap()
    }

    #[test]
    fn zero_interval_is_rejected() {
        let generator = ReadingGenerator::seeded(&GeneratorConfig::default(), 1).unwrap();
        let result = SensorHub::new(
            generator,
            HistoryBuffer::new(3).unwrap(),
            Duration::ZERO,
            BroadcastMode::PerSession,
        );
        assert!(matches!(result, Err(HubError::InvalidInterval)));
    }

    #[test]
    fn from_config_propagates_invalid_ranges() {
        let mut config = SensorConfig::default();
        config.generator.max_temp = config.generator.min_temp;
        assert!(matches!(
            SensorHub::from_config(&config),
            Err(HubError::Generator { .. })
        ));

        let mut config = SensorConfig::default();
        config.stream.history_capacity = 0;
        assert!(matches!(
            SensorHub::from_config(&config),
            Err(HubError::History { .. })
        ));
    }

    #[tokio::test]
    async fn current_does_not_touch_history() {
        let hub = hub(5);
        let _ = hub.current().await;
        assert_eq!(hub.history_len().await, 0);
    }

    #[tokio::test]
    async fn record_tick_appends_and_evicts() {
        let hub = hub(3);
        let mut produced = Vec::new();
        for _ in 0..7 {
            produced.push(hub.record_tick().await);
        }
        let history = hub.history().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history, produced.split_off(4));
    }

    #[tokio::test]
    async fn snapshot_tops_up_partial_history() {
        let hub = hub(6);
        let first = hub.record_tick().await;
        let second = hub.record_tick().await;

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.len(), 6);
        assert_eq!(snapshot.readings.first(), Some(&first));
        assert_eq!(snapshot.readings.get(1), Some(&second));
    }

    #[tokio::test]
    async fn spawn_ticker_is_noop_per_session() {
        let hub = Arc::new(hub(2));
        assert!(hub.spawn_ticker().is_none());
    }
}
