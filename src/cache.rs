//! Instrumented cache wrapper placed in front of a key-value store.
//!
//! The wrapper forwards reads and writes to the store and records, per key,
//! how many reads hit and how many missed, plus the latency of hits. It keeps
//! no copy of cached values: the store owns them.
//!
//! # Concurrency
//! - Any number of callers may use the wrapper concurrently
//! - `compute_if_absent` is not single-flight: concurrent misses on one key
//!   each run their producer and each write back; the last write wins
//! - Recording statistics only costs atomic adds on the request path

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::reporter::{LogSink, StatsReporter};
use crate::stats::{CacheStatistics, KeyStatistics, StatisticsSnapshot};
use crate::store::KeyValueStore;

// ================================================================================================
// CACHE WRAPPER
// ================================================================================================

/// Statistics-tracking facade over a [`KeyValueStore`].
pub struct CacheWrapper<S: KeyValueStore> {
    /// Backing store, injected by the composition root
    store: Arc<S>,
    /// Hit/miss/latency bookkeeping, shared with the reporter
    stats: Arc<CacheStatistics>,
    /// Background reporter, present when started through [`CacheWrapper::start`]
    reporter: Option<StatsReporter>,
    config: CacheConfig,
}

impl<S: KeyValueStore> CacheWrapper<S> {
    /// Creates a wrapper without a background reporter.
    pub fn new(store: Arc<S>, config: CacheConfig) -> Self {
        Self {
            store,
            stats: Arc::new(CacheStatistics::new(config.record_statistics)),
            reporter: None,
            config,
        }
    }

    /// Creates a wrapper and spawns its reporter (when enabled) logging through [`LogSink`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: Arc<S>, config: CacheConfig) -> Self {
        let mut cache = Self::new(store, config);
        let reporter = StatsReporter::spawn(
            Arc::clone(&cache.stats),
            cache.config.reporter.clone(),
            Arc::new(LogSink),
        );
        cache.reporter = Some(reporter);
        cache
    }

    /// Stops the background reporter, waiting for it to exit. No-op without one.
    pub async fn shutdown(&self) {
        if let Some(reporter) = &self.reporter {
            reporter.stop().await;
        }
    }

    // ============================================================================================
    // ACCESSORS
    // ============================================================================================

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Shared statistics handle, e.g. for a custom reporter.
    pub fn stats_handle(&self) -> Arc<CacheStatistics> {
        Arc::clone(&self.stats)
    }

    pub fn reporter(&self) -> Option<&StatsReporter> {
        self.reporter.as_ref()
    }

    // ============================================================================================
    // READ / WRITE
    // ============================================================================================

    /// Reads `key` from the store.
    ///
    /// A non-empty value counts as a hit and its latency is recorded. An absent
    /// or empty value, or a store error, counts as a miss; store errors are
    /// returned unchanged after being counted.
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let start = Instant::now();

        match self.store.get(key).await {
            Ok(Some(value)) if !value.is_empty() => {
                self.stats.record_hit(key, start.elapsed());
                Ok(Some(value))
            }
            Ok(_) => {
                self.stats.record_miss(key);
                Ok(None)
            }
            Err(e) => {
                debug!("Cache read for '{}' failed, counted as miss: {}", key, e);
                self.stats.record_miss(key);
                Err(e)
            }
        }
    }

    /// Writes `value` under `key` with no expiration.
    pub async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.store.set(key, value, None).await
    }

    /// Writes `value` under `key`, expiring after `ttl`.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.store.set(key, value, Some(ttl)).await
    }

    /// Returns the cached value for `key`, or runs `producer`, writes its result
    /// back and returns it.
    ///
    /// A failed read is treated as a miss. A failed write-back is logged and
    /// ignored: the produced value is still returned.
    pub async fn compute_if_absent<F, Fut>(&self, key: &str, producer: F) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        if let Ok(Some(cached)) = self.get(key).await {
            return cached;
        }

        let value = producer().await;
        self.write_back(key, &value).await;
        value
    }

    /// Typed variant of [`compute_if_absent`](Self::compute_if_absent) storing JSON.
    ///
    /// Decoding a cached value and encoding a produced one both surface
    /// [`CacheError::Serialization`](crate::CacheError::Serialization); nothing
    /// falls back to a default value. Write-back failures are ignored as in
    /// `compute_if_absent`.
    pub async fn remember<T, F, Fut>(&self, key: &str, producer: F) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Ok(Some(cached)) = self.get(key).await {
            return Ok(serde_json::from_str(&cached)?);
        }

        let value = producer().await;
        let encoded = serde_json::to_string(&value)?;
        self.write_back(key, &encoded).await;
        Ok(value)
    }

    async fn write_back(&self, key: &str, value: &str) {
        if let Err(e) = self.set(key, value).await {
            warn!("Failed to write back cache entry '{}': {}", key, e);
        }
    }

    // ============================================================================================
    // STATISTICS
    // ============================================================================================

    /// Hits and misses for `key`; `StatisticsNotFound` when the key was never read.
    pub fn key_statistics(&self, key: &str) -> CacheResult<KeyStatistics> {
        self.stats.key_statistics(key)
    }

    /// Hits and misses for every key read so far, both fields always populated.
    pub fn statistics(&self) -> BTreeMap<String, KeyStatistics> {
        self.stats.statistics()
    }

    /// Mean hit latency in microseconds, 0.0 before the first hit.
    pub fn average_hit_latency(&self) -> f64 {
        self.stats.average_hit_latency()
    }

    /// Statistics plus average latency in one value.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }
}
