//! Integration tests for the sensor hub: history priming, eviction,
//! session cadence, cancellation, and shared fan-out.
//!
//! Cadence tests run on a paused Tokio clock so ticks are deterministic.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use sensorstream_core::config::GeneratorConfig;
use sensorstream_core::{
    BroadcastMode, CloseReason, HistoryBuffer, ReadingGenerator, SENSOR_UPDATE, SensorHub,
    SessionState,
};
use sensorstream_core::hub::SHARED_CHANNEL_CAPACITY;
use sensorstream_types::SensorStatus;

fn make_hub(capacity: usize, interval: Duration, mode: BroadcastMode) -> Arc<SensorHub> {
    let generator = ReadingGenerator::seeded(&GeneratorConfig::default(), 2024).unwrap();
    let history = HistoryBuffer::new(capacity).unwrap();
    Arc::new(SensorHub::new(generator, history, interval, mode).unwrap())
}

fn per_session_hub() -> Arc<SensorHub> {
    make_hub(20, Duration::from_secs(1), BroadcastMode::PerSession)
}

// =========================================================================
// History
// =========================================================================

#[tokio::test]
async fn snapshot_on_empty_history_primes_full_window() {
    let hub = per_session_hub();
    assert_eq!(hub.history_len().await, 0);

    let snapshot = hub.snapshot().await;

    assert_eq!(snapshot.readings.len(), 20);
    assert_eq!(snapshot.temperatures.len(), 20);
    assert_eq!(snapshot.humidities.len(), 20);
    let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
    assert_eq!(snapshot.labels, expected);
    assert_eq!(hub.history_len().await, 20);

    for (reading, (temp, humidity)) in snapshot
        .readings
        .iter()
        .zip(snapshot.temperatures.iter().zip(&snapshot.humidities))
    {
        assert_eq!(reading.temperature(), *temp);
        assert_eq!(reading.humidity(), *humidity);
        assert!((18.0..=26.0).contains(temp));
        assert!((30.0..=65.0).contains(humidity));
        assert!(SensorStatus::ALL.contains(&reading.status()));
    }
}

#[tokio::test]
async fn repeated_snapshots_on_full_history_are_stable() {
    let hub = per_session_hub();
    let first = hub.snapshot().await;
    let second = hub.snapshot().await;
    assert_eq!(first.len(), 20);
    assert_eq!(second.len(), 20);
    assert_eq!(first, second);
}

#[tokio::test]
async fn snapshot_after_new_tick_shifts_window() {
    let hub = per_session_hub();
    let before = hub.snapshot().await;
    let newest = hub.record_tick().await;
    let after = hub.snapshot().await;

    assert_eq!(after.len(), 20);
    assert_eq!(after.readings.last(), Some(&newest));
    assert_eq!(after.readings.first(), before.readings.get(1));
}

#[tokio::test]
async fn overflowing_history_keeps_latest_in_order() {
    let hub = make_hub(5, Duration::from_secs(1), BroadcastMode::PerSession);
    let mut produced = Vec::new();
    for _ in 0..12 {
        produced.push(hub.record_tick().await);
    }
    let history = hub.history().await;
    assert_eq!(history, produced.split_off(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_snapshots_prime_once() {
    let hub = per_session_hub();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move { hub.snapshot().await })
        })
        .collect();

    let mut snapshots = Vec::new();
    for handle in handles {
        snapshots.push(handle.await.unwrap());
    }

    assert_eq!(hub.history_len().await, 20);
    let first = snapshots.first().cloned().unwrap();
    assert_eq!(first.len(), 20);
    assert!(snapshots.iter().all(|s| *s == first));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ticks_respect_capacity_and_order() {
    let hub = per_session_hub();
    let handles: Vec<_> = (0..64)
        .map(|_| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move { hub.record_tick().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let history = hub.history().await;
    assert_eq!(history.len(), 20);
    assert!(
        history
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.timestamp() <= b.timestamp()))
    );
}

// =========================================================================
// Per-session streaming
// =========================================================================

#[tokio::test(start_paused = true)]
async fn cancel_before_first_tick_emits_nothing() {
    let hub = per_session_hub();
    let mut session = hub.subscribe();
    assert_eq!(session.state(), SessionState::Connecting);

    session.cancel();

    assert!(session.next().await.is_none());
    assert_eq!(session.state(), SessionState::Closed(CloseReason::Cancelled));
    assert_eq!(hub.history_len().await, 0);
    assert_eq!(hub.active_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn three_ticks_emit_three_events() {
    let hub = per_session_hub();
    let start = tokio::time::Instant::now();
    let mut session = hub.subscribe();

    let mut events = Vec::new();
    for _ in 0..3 {
        events.push(session.next().await.unwrap());
    }

    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(hub.history_len().await, 3);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(events.iter().all(|e| e.kind() == SENSOR_UPDATE));
    assert!(events.windows(2).all(|pair| {
        matches!(pair, [a, b] if a.reading().timestamp() <= b.reading().timestamp())
    }));

    let history = hub.history().await;
    let streamed: Vec<_> = events.into_iter().map(|e| e.into_reading()).collect();
    assert_eq!(history, streamed);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_wait_unwinds_without_partial_event() {
    let hub = per_session_hub();
    let mut session = hub.subscribe();
    assert!(session.next().await.is_some());

    let token = session.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        token.cancel();
    });

    let start = tokio::time::Instant::now();
    assert!(session.next().await.is_none());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(hub.history_len().await, 1);
    assert!(session.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_a_session_closes_it() {
    let hub = per_session_hub();
    let first = hub.subscribe();
    let mut second = hub.subscribe();
    assert_eq!(hub.active_sessions(), 2);

    drop(first);
    assert_eq!(hub.active_sessions(), 1);

    assert!(second.next().await.is_some());
    assert_eq!(hub.history_len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn independent_sessions_each_append() {
    let hub = per_session_hub();
    let mut a = hub.subscribe();
    let mut b = hub.subscribe();

    let ra = a.next().await.unwrap();
    let rb = b.next().await.unwrap();

    assert_ne!(ra, rb);
    assert_eq!(hub.history_len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_every_session() {
    let hub = per_session_hub();
    let mut a = hub.subscribe();
    let mut b = hub.subscribe();
    assert!(a.next().await.is_some());

    hub.shutdown();

    assert!(hub.is_shut_down());
    assert!(a.next().await.is_none());
    assert!(b.next().await.is_none());
    assert_eq!(b.state(), SessionState::Closed(CloseReason::Cancelled));

    let mut late = hub.subscribe();
    assert!(late.next().await.is_none());
}

// =========================================================================
// Shared fan-out
// =========================================================================

#[tokio::test(start_paused = true)]
async fn shared_mode_fans_out_one_reading_per_tick() {
    let hub = make_hub(20, Duration::from_secs(1), BroadcastMode::Shared);
    let mut a = hub.subscribe();
    let mut b = hub.subscribe();
    let ticker = hub.spawn_ticker().unwrap();

    for expected_len in 1..=3 {
        let ra = a.next().await.unwrap();
        let rb = b.next().await.unwrap();
        assert_eq!(ra, rb);
        assert_eq!(hub.history_len().await, expected_len);
    }

    hub.shutdown();
    ticker.await.unwrap();
    assert!(a.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn shared_ticker_skips_ticks_without_subscribers() {
    let hub = make_hub(20, Duration::from_secs(1), BroadcastMode::Shared);
    let ticker = hub.spawn_ticker().unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(hub.history_len().await, 0);

    hub.shutdown();
    ticker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn lagging_shared_subscriber_skips_to_oldest_buffered_reading() {
    let hub = make_hub(20, Duration::from_secs(1), BroadcastMode::Shared);
    let mut lagging = hub.subscribe();
    let mut b = hub.subscribe();
    let ticker = hub.spawn_ticker().unwrap();

    let overrun = 6;
    let mut b_events = Vec::new();
    for _ in 0..SHARED_CHANNEL_CAPACITY + overrun {
        b_events.push(b.next().await.unwrap());
    }

    // The channel keeps the newest SHARED_CHANNEL_CAPACITY readings.
    let first = lagging.next().await.unwrap();
    assert_eq!(first, b_events[overrun]);
    assert_eq!(lagging.state(), SessionState::Active);

    let second = lagging.next().await.unwrap();
    assert_eq!(second, b_events[overrun + 1]);

    hub.shutdown();
    ticker.await.unwrap();
    assert!(lagging.next().await.is_none());
}
