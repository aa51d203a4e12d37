//! Collector Background Task
//!
//! Drives every adapter in a fixed order, one tick each per round, moving
//! queued records into their topic caches. The task is the only writer of
//! the caches; HTTP handlers only read them.
//!
//! # Idle policy
//!
//! A round in which no adapter delivered a record ends with a sleep of
//! `idle_sleep`, cut short by a stop signal. A round that delivered anything
//! yields to the runtime and starts the next round straight away.
//!
//! # Shutdown
//!
//! [`CollectorHandle::stop`] signals the task and waits for it. The task
//! also ends when the handle is dropped. Either way the current round runs
//! to completion first.

use lighthouse_core::{Adapter, CoreError, TickOutcome};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::CollectorSettings;
use crate::constants::DEFAULT_IDLE_SLEEP_MS;
use crate::telemetry::metrics::with_metrics;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the collector task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Sleep after a round with no deliveries (default: 10 ms)
    pub idle_sleep: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            idle_sleep: Duration::from_millis(DEFAULT_IDLE_SLEEP_MS),
        }
    }
}

impl From<&CollectorSettings> for CollectorConfig {
    fn from(settings: &CollectorSettings) -> Self {
        Self {
            idle_sleep: settings.idle_sleep(),
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorState {
    Stopped,
    Running,
}

/// Counters for collector activity since start.
#[derive(Debug, Default)]
pub struct CollectorMetrics {
    /// Rounds started
    pub rounds: AtomicU64,

    /// Records moved into a topic cache
    pub records_delivered: AtomicU64,

    /// Queue reads that failed (malformed or unreadable messages)
    pub source_errors: AtomicU64,

    /// Records a topic cache rejected
    pub feed_errors: AtomicU64,

    running: AtomicBool,
}

impl CollectorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CollectorState {
        if self.running.load(Ordering::Acquire) {
            CollectorState::Running
        } else {
            CollectorState::Stopped
        }
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> CollectorSnapshot {
        CollectorSnapshot {
            state: self.state(),
            rounds: self.rounds.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            source_errors: self.source_errors.load(Ordering::Relaxed),
            feed_errors: self.feed_errors.load(Ordering::Relaxed),
        }
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

/// Snapshot of collector metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectorSnapshot {
    pub state: CollectorState,
    pub rounds: u64,
    pub records_delivered: u64,
    pub source_errors: u64,
    pub feed_errors: u64,
}

// ============================================================================
// COLLECTOR
// ============================================================================

/// A collector that has not been started yet.
#[derive(Debug)]
pub struct Collector {
    adapters: Vec<Adapter>,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(adapters: Vec<Adapter>, config: CollectorConfig) -> Self {
        Self { adapters, config }
    }

    /// Spawn the collector task on the current tokio runtime.
    pub fn start(self) -> CollectorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = Arc::new(CollectorMetrics::new());
        metrics.set_running(true);

        let task = tokio::spawn(collector_task(
            self.adapters,
            self.config,
            Arc::clone(&metrics),
            shutdown_rx,
        ));

        CollectorHandle {
            shutdown_tx,
            metrics,
            task,
        }
    }
}

/// Owner of a running collector. Dropping it stops the task.
#[derive(Debug)]
pub struct CollectorHandle {
    shutdown_tx: watch::Sender<bool>,
    metrics: Arc<CollectorMetrics>,
    task: JoinHandle<()>,
}

impl CollectorHandle {
    pub fn state(&self) -> CollectorState {
        self.metrics.state()
    }

    /// Shared counters; stays readable after the collector stops.
    pub fn metrics(&self) -> Arc<CollectorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn status(&self) -> CollectorSnapshot {
        self.metrics.snapshot()
    }

    /// Signal the task and wait for the current round to finish.
    pub async fn stop(self) -> CollectorSnapshot {
        // Err only if the task is already gone.
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Collector task ended abnormally");
            self.metrics.set_running(false);
        }
        self.metrics.snapshot()
    }
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Clears the running flag however the task ends, panics included.
struct RunningGuard(Arc<CollectorMetrics>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

/// Collector loop. Runs until a stop signal arrives or the sender is dropped.
pub async fn collector_task(
    mut adapters: Vec<Adapter>,
    config: CollectorConfig,
    metrics: Arc<CollectorMetrics>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let _running = RunningGuard(Arc::clone(&metrics));
    tracing::info!(
        adapters = adapters.len(),
        idle_sleep_ms = config.idle_sleep.as_millis() as u64,
        "Collector started"
    );

    loop {
        if *shutdown_rx.borrow() {
            tracing::info!("Collector shutting down");
            break;
        }
        if shutdown_rx.has_changed().is_err() {
            tracing::info!("Collector handle dropped, shutting down");
            break;
        }

        let delivered = run_round(&mut adapters, &metrics);

        if delivered == 0 {
            tokio::select! {
                _ = tokio::time::sleep(config.idle_sleep) => {}
                // Either a stop signal or a dropped handle; the next
                // iteration decides which.
                _ = shutdown_rx.changed() => {}
            }
        } else {
            tokio::task::yield_now().await;
        }
    }

    metrics.set_running(false);
    let snapshot = metrics.snapshot();
    tracing::info!(
        rounds = snapshot.rounds,
        records_delivered = snapshot.records_delivered,
        source_errors = snapshot.source_errors,
        feed_errors = snapshot.feed_errors,
        "Collector stopped"
    );
}

/// Tick every adapter once, in order. Returns the number of deliveries.
fn run_round(adapters: &mut [Adapter], metrics: &CollectorMetrics) -> u64 {
    metrics.rounds.fetch_add(1, Ordering::Relaxed);
    let mut delivered = 0u64;

    for adapter in adapters.iter_mut() {
        match adapter.tick() {
            Ok(TickOutcome::Delivered) => {
                delivered += 1;
                metrics.records_delivered.fetch_add(1, Ordering::Relaxed);
                with_metrics(|m| m.record_delivery(adapter.name()));
            }
            Ok(TickOutcome::Empty) => {}
            Err(CoreError::Source(e)) => {
                tracing::error!(
                    adapter = %adapter.name(),
                    error = %e,
                    "Failed to receive from queue"
                );
                metrics.source_errors.fetch_add(1, Ordering::Relaxed);
                with_metrics(|m| m.record_collector_error(adapter.name(), "source"));
            }
            Err(e) => {
                tracing::error!(
                    adapter = %adapter.name(),
                    error = %e,
                    "Failed to feed topic cache"
                );
                metrics.feed_errors.fetch_add(1, Ordering::Relaxed);
                with_metrics(|m| m.record_collector_error(adapter.name(), "feed"));
            }
        }
    }

    if delivered > 0 {
        tracing::trace!(delivered, "Collector round completed");
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use lighthouse_core::{AgingCacheTarget, ChannelSource, Record, Source, SourceError, Target};
    use lighthouse_test_utils::fixtures::record;
    use lighthouse_test_utils::MockSource;
    use serde_json::json;
    use tokio::sync::mpsc;

    struct ExplodingSource;

    impl Source for ExplodingSource {
        fn name(&self) -> &str {
            "exploding"
        }

        fn try_receive(&mut self) -> Result<Option<Record>, SourceError> {
            panic!("queue driver crashed")
        }
    }

    fn fast() -> CollectorConfig {
        CollectorConfig {
            idle_sleep: Duration::from_millis(5),
        }
    }

    async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn test_collector_config_default() {
        assert_eq!(CollectorConfig::default().idle_sleep, Duration::from_millis(10));
        let settings = CollectorSettings { idle_sleep_ms: 3 };
        assert_eq!(CollectorConfig::from(&settings).idle_sleep, Duration::from_millis(3));
    }

    #[test]
    fn test_round_ticks_each_adapter_once() {
        let first = MockSource::with_records(
            "first",
            vec![record(json!({"v": 1})), record(json!({"v": 2}))],
        );
        let second = MockSource::with_records("second", vec![record(json!({"v": 3}))]);
        let target_a = Arc::new(AgingCacheTarget::new("a", None, Duration::from_secs(10)));
        let target_b = Arc::new(AgingCacheTarget::new("b", None, Duration::from_secs(10)));
        let mut adapters = vec![
            Adapter::new("first", Box::new(first.clone()), target_a),
            Adapter::new("second", Box::new(second.clone()), target_b),
        ];
        let metrics = CollectorMetrics::new();

        assert_eq!(run_round(&mut adapters, &metrics), 2);
        assert_eq!(first.pending(), 1);
        assert_eq!(second.pending(), 0);

        assert_eq!(run_round(&mut adapters, &metrics), 1);
        assert_eq!(run_round(&mut adapters, &metrics), 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rounds, 3);
        assert_eq!(snapshot.records_delivered, 3);
    }

    #[test]
    fn test_round_counts_errors_and_continues() {
        let queue = MockSource::new("nodes");
        queue.push_malformed("not json");
        let target = Arc::new(AgingCacheTarget::new(
            "nodes",
            Some("node".to_string()),
            Duration::from_secs(10),
        ));
        let other = MockSource::with_records("cpu", vec![record(json!({"load": 0.5}))]);
        let cpu = Arc::new(AgingCacheTarget::new("cpu", None, Duration::from_secs(10)));
        let mut adapters = vec![
            Adapter::new("nodes", Box::new(queue.clone()), target),
            Adapter::new("cpu", Box::new(other), cpu.clone()),
        ];
        let metrics = CollectorMetrics::new();

        assert_eq!(run_round(&mut adapters, &metrics), 1);
        queue.push(record(json!({"no_node": true})));
        assert_eq!(run_round(&mut adapters, &metrics), 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.source_errors, 1);
        assert_eq!(snapshot.feed_errors, 1);
        assert_eq!(cpu.len().ok(), Some(1));
    }

    #[tokio::test]
    async fn test_start_deliver_stop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let target = Arc::new(AgingCacheTarget::new("cpu", None, Duration::from_secs(10)));
        let adapter = Adapter::new("cpu", Box::new(ChannelSource::new("cpu", rx)), target.clone());

        let handle = Collector::new(vec![adapter], fast()).start();
        assert_eq!(handle.state(), CollectorState::Running);

        tx.send(record(json!({"load": 0.25}))).ok();
        let watched = target.clone();
        assert!(wait_for(|| watched.fresh_count().ok() == Some(1)).await);

        let snapshot = handle.stop().await;
        assert_eq!(snapshot.state, CollectorState::Stopped);
        assert_eq!(snapshot.records_delivered, 1);

        let body = target.snapshot().map(|s| s.to_json()).ok();
        assert_eq!(body.as_ref().map(|b| b["cpu"]["load"].clone()), Some(json!(0.25)));
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_collector() {
        let queue = MockSource::new("idle");
        let target = Arc::new(AgingCacheTarget::new("idle", None, Duration::from_secs(10)));
        let adapter = Adapter::new("idle", Box::new(queue), target);
        let handle = Collector::new(vec![adapter], fast()).start();
        let metrics = handle.metrics();

        drop(handle);
        assert!(wait_for(|| metrics.state() == CollectorState::Stopped).await);
    }

    #[tokio::test]
    async fn test_panicking_source_clears_running_state() {
        let target = Arc::new(AgingCacheTarget::new("boom", None, Duration::from_secs(10)));
        let adapter = Adapter::new("boom", Box::new(ExplodingSource), target);
        let handle = Collector::new(vec![adapter], fast()).start();
        let metrics = handle.metrics();

        assert!(wait_for(|| metrics.state() == CollectorState::Stopped).await);
        assert_eq!(handle.stop().await.state, CollectorState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_with_no_adapters() {
        let handle = Collector::new(vec![], fast()).start();
        let snapshot = handle.stop().await;
        assert_eq!(snapshot.state, CollectorState::Stopped);
        assert_eq!(snapshot.records_delivered, 0);
    }
}
