//! # Statistics Recorder
//!
//! Thread-safe hit/miss/latency bookkeeping shared by the cache wrapper and
//! the background reporter. Recording never fails and never blocks on the
//! request path beyond atomic adds.

use std::collections::BTreeMap;
use std::time::Duration;

use super::counter::StatsCounter;
use super::latency::LatencyAccumulator;
use super::snapshot::{KeyStatistics, StatisticsSnapshot};
use crate::error::{CacheError, CacheResult};

/// Hit and miss counters plus hit latency for one cache wrapper.
#[derive(Debug)]
pub struct CacheStatistics {
    /// Whether recording is enabled
    enabled: bool,

    /// Per-key hit counts
    hits: StatsCounter,

    /// Per-key miss counts
    misses: StatsCounter,

    /// Latency of hits only
    hit_latency: LatencyAccumulator,
}

impl Default for CacheStatistics {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CacheStatistics {
    /// Create a recorder. When `enabled` is false every `record_*` call is a no-op.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            hits: StatsCounter::new(),
            misses: StatsCounter::new(),
            hit_latency: LatencyAccumulator::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a hit for `key` that took `elapsed` to serve.
    pub fn record_hit(&self, key: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        self.hits.increment(key);
        self.hit_latency.record(elapsed);
    }

    /// Record a miss for `key`. Misses carry no latency sample.
    pub fn record_miss(&self, key: &str) {
        if !self.enabled {
            return;
        }
        self.misses.increment(key);
    }

    /// Hit and miss counts for `key`.
    ///
    /// Fails with [`CacheError::StatisticsNotFound`] when both are zero.
    pub fn key_statistics(&self, key: &str) -> CacheResult<KeyStatistics> {
        let stats = KeyStatistics {
            hits: self.hits.get(key),
            misses: self.misses.get(key),
        };
        if stats.total() == 0 {
            return Err(CacheError::StatisticsNotFound(key.to_string()));
        }
        Ok(stats)
    }

    /// Counts for every key seen by either counter. Absent sides default to 0.
    pub fn statistics(&self) -> BTreeMap<String, KeyStatistics> {
        let mut merged: BTreeMap<String, KeyStatistics> = BTreeMap::new();

        for (key, hits) in self.hits.get_all() {
            merged.entry(key).or_default().hits = hits;
        }
        for (key, misses) in self.misses.get_all() {
            merged.entry(key).or_default().misses = misses;
        }

        merged
    }

    /// Mean hit latency in microseconds, 0.0 before the first hit.
    pub fn average_hit_latency(&self) -> f64 {
        self.hit_latency.average_micros()
    }

    /// Total hit samples recorded.
    pub fn hit_count(&self) -> u64 {
        self.hit_latency.count()
    }

    /// Full snapshot for reporting.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            keys: self.statistics(),
            average_hit_latency_us: self.average_hit_latency(),
        }
    }
}
