//! Statistics value types handed to callers and sinks.

use serde::Serialize;
use std::collections::BTreeMap;

/// Hit and miss counts for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyStatistics {
    pub hits: u64,
    pub misses: u64,
}

impl KeyStatistics {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Aggregate statistics at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    /// Per-key counts, every key seen by either counter, both fields populated
    pub keys: BTreeMap<String, KeyStatistics>,
    /// Mean hit latency in microseconds
    pub average_hit_latency_us: f64,
}

impl StatisticsSnapshot {
    /// Hits summed over every key.
    pub fn total_hits(&self) -> u64 {
        self.keys.values().map(|s| s.hits).sum()
    }

    /// Misses summed over every key.
    pub fn total_misses(&self) -> u64 {
        self.keys.values().map(|s| s.misses).sum()
    }

    /// True until some key has been read.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
