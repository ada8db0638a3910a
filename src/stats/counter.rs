//! Per-key monotonic counters.
//!
//! The map structure is guarded by a read/write lock; each count lives in its
//! own `AtomicU64` cell. Increments to an existing key only take the shared
//! read lock plus one atomic add, so they never wait on each other. The
//! exclusive lock is held only for the first increment of a new key.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Concurrent mapping from key to a monotonically non-decreasing count.
///
/// Keys are never removed for the lifetime of the counter.
#[derive(Debug, Default)]
pub struct StatsCounter {
    cells: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl StatsCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `key` by one.
    ///
    /// Concurrent first increments of an unseen key create exactly one cell;
    /// the loser of the insertion race adds to the winner's cell.
    pub fn increment(&self, key: &str) {
        if let Some(cell) = self.cells.read().get(key) {
            cell.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut cells = self.cells.write();
        cells
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for `key`, 0 if it was never incremented.
    pub fn get(&self, key: &str) -> u64 {
        self.cells
            .read()
            .get(key)
            .map(|cell| cell.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Point-in-time copy of every count.
    ///
    /// Each entry is individually consistent; entries may reflect slightly
    /// different instants under concurrent writers.
    pub fn get_all(&self) -> HashMap<String, u64> {
        self.cells
            .read()
            .iter()
            .map(|(key, cell)| (key.clone(), cell.load(Ordering::Relaxed)))
            .collect()
    }

    /// Number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// True until the first increment.
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }
}
