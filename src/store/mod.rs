//! Key-value store contract consumed by the cache wrapper and rate limiters.
//!
//! The store is an external collaborator: a Redis-compatible server reached
//! through a client the application brings. Only the operations below are
//! relied upon:
//!
//! - string `get`/`set` with optional expiry
//! - `set_if_absent` with expiry (SETNX + PX)
//! - atomic `increment`/`decrement`/`decrement_by` on integer strings
//! - `expire` on an existing key
//!
//! [`MemoryStore`] is an in-process implementation with the same contracts,
//! used by tests, benchmarks and the demo binary.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CacheResult;

/// Remote key-value store with atomic counters and TTL-bearing keys.
///
/// Implementations must be safe to share across tasks. No operation carries an
/// implicit timeout; callers wrap calls in `tokio::time::timeout` when they
/// need one.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the string stored under `key`. Absent or expired keys yield `Ok(None)`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value and expiry.
    /// `ttl = None` stores the key without expiration.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Store `value` only if `key` does not exist. Returns whether the write happened.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Option<Duration>)
        -> CacheResult<bool>;

    /// Atomically add one. A missing key counts from zero.
    async fn increment(&self, key: &str) -> CacheResult<i64>;

    /// Atomically subtract one. A missing key counts from zero.
    async fn decrement(&self, key: &str) -> CacheResult<i64>;

    /// Atomically subtract `amount`. A missing key counts from zero.
    async fn decrement_by(&self, key: &str, amount: i64) -> CacheResult<i64>;

    /// Set an expiry on an existing key. Returns `false` when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    /// Initialise `key` to `initial` with `ttl` if absent, then decrement it by one.
    ///
    /// The two commands are independent: creation never overwrites an existing
    /// value and the decrement always applies. Backends that support pipelining
    /// send both in a single round trip; the default issues them back to back.
    async fn set_if_absent_then_decrement(
        &self,
        key: &str,
        initial: i64,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.set_if_absent(key, &initial.to_string(), ttl).await?;
        self.decrement(key).await?;
        Ok(())
    }
}
