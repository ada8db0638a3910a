//! Hit latency accumulator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Running total of hit latency in microseconds plus the number of samples.
///
/// The two fields are updated by independent atomic adds with no cross-field
/// lock. A reader may see a sample counted before its latency has been added;
/// [`average_micros`](Self::average_micros) tolerates that window.
#[derive(Debug, Default)]
pub struct LatencyAccumulator {
    total_micros: AtomicU64,
    count: AtomicU64,
}

impl LatencyAccumulator {
    /// Create an accumulator with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    #[inline]
    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Sum of all samples in microseconds.
    pub fn total_micros(&self) -> u64 {
        self.total_micros.load(Ordering::Relaxed)
    }

    /// Number of samples recorded.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Mean sample in microseconds; 0.0 before the first sample.
    pub fn average_micros(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.total_micros() as f64 / count as f64
    }
}
