//! Periodic statistics reporter - background task emitting cache statistics.
//!
//! The reporter snapshots a [`CacheStatistics`] on a fixed interval and hands
//! the result to a [`StatsSink`]. It runs independently of the request path:
//! a snapshot only takes the counters' shared read locks.
//!
//! # Lifecycle
//!
//! - [`StatsReporter::spawn`] starts the task (needs a tokio runtime)
//! - the first emission happens one interval after spawning
//! - [`StatsReporter::stop`] signals the task and waits for it to exit, so no
//!   emission can race the shutdown; calling it again is a no-op
//! - dropping the reporter signals stop without waiting

use log::{debug, error, info};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::ReporterConfig;
use crate::stats::{CacheStatistics, StatisticsSnapshot};

/// Floor for the tick period; tokio rejects a zero interval.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Milliseconds since UNIX epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One periodic emission.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// 1-based tick number since the reporter started
    pub tick: u64,
    /// Emission time (Unix timestamp ms)
    pub emitted_at_ms: u64,
    /// Statistics at emission time
    pub snapshot: StatisticsSnapshot,
}

/// Destination for periodic reports (log, metrics exporter, test probe).
pub trait StatsSink: Send + Sync {
    fn emit(&self, report: &StatsReport);
}

/// Sink writing reports through the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl StatsSink for LogSink {
    fn emit(&self, report: &StatsReport) {
        if report.snapshot.is_empty() {
            debug!("Periodic stats update: no keys read yet");
            return;
        }
        match serde_json::to_string(&report.snapshot.keys) {
            Ok(json) => info!("Periodic stats update: {}", json),
            Err(e) => error!("Failed to encode stats snapshot: {}", e),
        }
        info!(
            "Average hit latency: {:.2}µs",
            report.snapshot.average_hit_latency_us
        );
    }
}

/// Handle to the background reporting task.
pub struct StatsReporter {
    /// Stop signal, flipped to `true` once
    stop_tx: watch::Sender<bool>,
    /// Task handle; taken by the first `stop`
    handle: Mutex<Option<JoinHandle<()>>>,
    /// Number of reports emitted
    reports: Arc<AtomicU64>,
    /// Timestamp of the last emission
    last_report_at: Arc<RwLock<Option<u64>>>,
}

impl StatsReporter {
    /// Spawn the reporter on the current tokio runtime.
    ///
    /// With `config.enabled == false` no task is started and the returned
    /// handle is inert.
    pub fn spawn(
        stats: Arc<CacheStatistics>,
        config: ReporterConfig,
        sink: Arc<dyn StatsSink>,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let reports = Arc::new(AtomicU64::new(0));
        let last_report_at = Arc::new(RwLock::new(None));

        let handle = if config.enabled {
            info!(
                "Starting statistics reporter with {}ms interval",
                config.interval.as_millis()
            );
            Some(tokio::spawn(run(
                stats,
                config,
                sink,
                stop_rx,
                Arc::clone(&reports),
                Arc::clone(&last_report_at),
            )))
        } else {
            info!("Statistics reporter is disabled, skipping");
            None
        };

        Self {
            stop_tx,
            handle: Mutex::new(handle),
            reports,
            last_report_at,
        }
    }

    /// Number of reports emitted so far.
    pub fn reports_emitted(&self) -> u64 {
        self.reports.load(Ordering::Acquire)
    }

    /// Timestamp (Unix ms) of the last emission, `None` before the first one.
    pub fn last_report_at(&self) -> Option<u64> {
        *self.last_report_at.read()
    }

    /// Signal the task to stop and wait until it has exited.
    ///
    /// Idempotent. Concurrent callers all return after the task is gone.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);

        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Statistics reporter panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

async fn run(
    stats: Arc<CacheStatistics>,
    config: ReporterConfig,
    sink: Arc<dyn StatsSink>,
    mut stop_rx: watch::Receiver<bool>,
    reports: Arc<AtomicU64>,
    last_report_at: Arc<RwLock<Option<u64>>>,
) {
    let period = config.interval.max(MIN_INTERVAL);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Fires on the stop signal and when the handle is gone.
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                let tick = reports.load(Ordering::Acquire) + 1;
                let report = StatsReport {
                    tick,
                    emitted_at_ms: now_ms(),
                    snapshot: stats.snapshot(),
                };
                sink.emit(&report);
                *last_report_at.write() = Some(report.emitted_at_ms);
                reports.store(tick, Ordering::Release);
            }
        }
    }

    info!("Statistics reporter stopped");
}
