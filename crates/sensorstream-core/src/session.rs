//! One subscriber's cancellable stream of `sensor_update` events.
//!
//! A [`SensorSession`] moves through
//! `Connecting -> Active -> Closed(Normal | Cancelled)`:
//!
//! - `Connecting`: created by [`SensorHub::subscribe`], nothing scheduled.
//! - `Active`: first polled; the first tick fires straight away and the
//!   following ones every tick interval.
//! - `Closed(Cancelled)`: the session token was cancelled, the hub shut
//!   down, or the session was dropped because the peer went away.
//! - `Closed(Normal)`: the shared broadcast channel closed.
//!
//! Cancellation is checked before every wait and unwinds the pending wait
//! at once. A tick that has not finished appending when cancellation
//! arrives is abandoned before anything is generated or emitted.
//!
//! [`SensorHub::subscribe`]: crate::hub::SensorHub::subscribe

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Fuse};
use futures::{Stream, StreamExt};
use sensorstream_types::{SensorReading, SessionId};
use tokio::sync::broadcast;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::hub::SensorHub;

/// Event name carried by every streamed reading.
pub const SENSOR_UPDATE: &str = "sensor_update";

/// A `sensor_update` event wrapping one reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    reading: SensorReading,
}

impl SensorEvent {
    /// Wrap a reading.
    pub const fn new(reading: SensorReading) -> Self {
        Self { reading }
    }

    /// Event name, always [`SENSOR_UPDATE`].
    pub const fn kind(&self) -> &'static str {
        SENSOR_UPDATE
    }

    /// The reading carried by this event.
    pub const fn reading(&self) -> &SensorReading {
        &self.reading
    }

    /// Unwrap the reading.
    pub fn into_reading(self) -> SensorReading {
        self.reading
    }

    /// The reading serialized as JSON.
    pub fn payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.reading)
    }
}

/// Why a session closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The event source ended on its own.
    Normal,
    /// The subscriber or the hub cancelled the session.
    Cancelled,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Subscribed, not yet polled.
    Connecting,
    /// Ticks are scheduled.
    Active,
    /// No further events will be emitted.
    Closed(CloseReason),
}

impl SessionState {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Active => 1,
            Self::Closed(CloseReason::Normal) => 2,
            Self::Closed(CloseReason::Cancelled) => 3,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Closed(CloseReason::Normal),
            _ => Self::Closed(CloseReason::Cancelled),
        }
    }

    /// Whether the session has closed.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    const fn new() -> Self {
        Self(AtomicU8::new(SessionState::Connecting.to_u8()))
    }

    fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: SessionState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }
}

/// Where a session's readings come from.
enum Source {
    /// Own interval, created lazily on first poll.
    PerSession(Option<Interval>),
    /// Fan-out from the hub's shared ticker.
    Shared(broadcast::Receiver<SensorReading>),
}

/// State threaded through the event stream. Dropping it is the single
/// place a session is accounted as closed.
struct Driver {
    id: SessionId,
    hub: Arc<SensorHub>,
    cancel: CancellationToken,
    state: Arc<StateCell>,
    source: Source,
}

impl Driver {
    /// Wait for the next reading. `None` means the source ended.
    async fn next_reading(&mut self) -> Option<SensorReading> {
        match &mut self.source {
            Source::PerSession(slot) => {
                let interval = slot.get_or_insert_with(|| {
                    let mut interval = tokio::time::interval(self.hub.tick_interval());
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval
                });
                self.state.set(SessionState::Active);
                interval.tick().await;
                Some(self.hub.record_tick().await)
            }
            Source::Shared(rx) => {
                self.state.set(SessionState::Active);
                loop {
                    match rx.recv().await {
                        Ok(reading) => return Some(reading),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(session = %self.id, skipped, "session lagged, skipping ahead");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        }
    }

    async fn step(mut self) -> Option<(SensorEvent, Self)> {
        if self.state.get().is_closed() {
            return None;
        }
        let cancel = self.cancel.clone();
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            reading = self.next_reading() => Some(reading),
        };
        match next {
            None => {
                self.state.set(SessionState::Closed(CloseReason::Cancelled));
                None
            }
            Some(None) => {
                self.state.set(SessionState::Closed(CloseReason::Normal));
                None
            }
            Some(Some(reading)) => Some((SensorEvent::new(reading), self)),
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        // Dropped while still open: the peer went away mid-wait.
        if !self.state.get().is_closed() {
            self.state.set(SessionState::Closed(CloseReason::Cancelled));
        }
        let active = self.hub.session_closed();
        debug!(session = %self.id, state = ?self.state.get(), active, "session closed");
    }
}

/// A subscriber's stream of [`SensorEvent`]s.
///
/// Implements [`Stream`]; the stream ends once the session closes and
/// never yields an error.
pub struct SensorSession {
    id: SessionId,
    cancel: CancellationToken,
    state: Arc<StateCell>,
    events: Fuse<BoxStream<'static, SensorEvent>>,
}

impl SensorSession {
    pub(crate) fn open(
        hub: Arc<SensorHub>,
        cancel: CancellationToken,
        shared: Option<broadcast::Receiver<SensorReading>>,
    ) -> Self {
        let id = SessionId::new();
        let state = Arc::new(StateCell::new());
        let source = shared.map_or(Source::PerSession(None), Source::Shared);
        let driver = Driver {
            id,
            hub,
            cancel: cancel.clone(),
            state: Arc::clone(&state),
            source,
        };
        let events = futures::stream::unfold(driver, Driver::step).boxed().fuse();
        Self {
            id,
            cancel,
            state,
            events,
        }
    }

    /// Identifier used in log lines for this session.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Cancel the session. The stream ends on its next poll.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this session when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl core::fmt::Debug for SensorSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Stream for SensorSession {
    type Item = SensorEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}
