//! In-process key-value store with Redis-compatible counter and TTL semantics.
//!
//! Expired keys are purged lazily on access. All operations take a single
//! short mutex hold, so each command is atomic with respect to the others,
//! and [`set_if_absent_then_decrement`](KeyValueStore::set_if_absent_then_decrement)
//! executes both commands under one hold, like a pipelined batch.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::KeyValueStore;
use crate::error::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: deadline(ttl),
        }
    }

    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Zero durations mean "no expiry", mirroring `SET key value PX 0` being rejected
/// and clients mapping non-positive TTLs to a plain `SET`. A TTL past the clock's
/// range also means "no expiry".
fn deadline(ttl: Option<Duration>) -> Option<Instant> {
    ttl.filter(|d| !d.is_zero()).and_then(|d| Instant::now().checked_add(d))
}

/// Thread-safe in-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Returns true if no live keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time to live for `key`; `None` when absent or persistent.
    pub fn time_to_live(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock();
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    fn purge_if_expired(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) {
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
    }

    fn insert_if_absent(
        entries: &mut HashMap<String, Entry>,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> bool {
        Self::purge_if_expired(entries, key, Instant::now());
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.to_string(), Entry::new(value.to_string(), ttl));
        true
    }

    /// Add `delta` to the integer stored under `key`, keeping its expiry.
    fn apply_delta(entries: &mut HashMap<String, Entry>, key: &str, delta: i64) -> CacheResult<i64> {
        Self::purge_if_expired(entries, key, Instant::now());

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new("0".to_string(), None));

        let current: i64 = entry
            .value
            .trim()
            .parse()
            .map_err(|_| CacheError::InvalidCounter {
                key: key.to_string(),
                value: entry.value.clone(),
            })?;

        let next = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::CounterOverflow {
                key: key.to_string(),
                delta,
            })?;

        entry.value = next.to_string();
        Ok(next)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock();
        Self::purge_if_expired(&mut entries, key, Instant::now());
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), Entry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        let mut entries = self.entries.lock();
        Ok(Self::insert_if_absent(&mut entries, key, value, ttl))
    }

    async fn increment(&self, key: &str) -> CacheResult<i64> {
        Self::apply_delta(&mut self.entries.lock(), key, 1)
    }

    async fn decrement(&self, key: &str) -> CacheResult<i64> {
        Self::apply_delta(&mut self.entries.lock(), key, -1)
    }

    async fn decrement_by(&self, key: &str, amount: i64) -> CacheResult<i64> {
        let delta = amount
            .checked_neg()
            .ok_or_else(|| CacheError::CounterOverflow {
                key: key.to_string(),
                delta: amount,
            })?;
        Self::apply_delta(&mut self.entries.lock(), key, delta)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_if_expired(&mut entries, key, now);
        if ttl.is_zero() {
            // EXPIRE with a non-positive timeout deletes the key.
            return Ok(entries.remove(key).is_some());
        }
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = now.checked_add(ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_if_absent_then_decrement(
        &self,
        key: &str,
        initial: i64,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let mut entries = self.entries.lock();
        Self::insert_if_absent(&mut entries, key, &initial.to_string(), ttl);
        Self::apply_delta(&mut entries, key, -1)?;
        Ok(())
    }
}
