//! Integration tests for the two rate-limiting algorithms.
//!
//! Tests verify:
//! - Sequential budgets for fixed-window and bounded counting limiters
//! - Refused requests leave the stored counter untouched
//! - Window expiry resets the budget
//! - The bounded limiter's read-then-decrement race is reproducible

use async_trait::async_trait;
use cacher::{
    bounded_counting_decrement, fixed_window_decrement, CacheResult, KeyValueStore, MemoryStore,
    RateDecision, RateLimiter,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const WINDOW: Duration = Duration::from_secs(60);

/// Store whose `get` waits until `parties` readers have all read their value.
///
/// Forces every concurrent caller to observe the same counter before any of
/// them decrements it.
struct GatedStore {
    inner: MemoryStore,
    barrier: Barrier,
}

impl GatedStore {
    fn new(parties: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self.inner.get(key).await?;
        self.barrier.wait().await;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn increment(&self, key: &str) -> CacheResult<i64> {
        self.inner.increment(key).await
    }

    async fn decrement(&self, key: &str) -> CacheResult<i64> {
        self.inner.decrement(key).await
    }

    async fn decrement_by(&self, key: &str, amount: i64) -> CacheResult<i64> {
        self.inner.decrement_by(key, amount).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        self.inner.expire(key, ttl).await
    }
}

async fn stored(store: &impl KeyValueStore, key: &str) -> i64 {
    store.get(key).await.unwrap().unwrap().parse().unwrap()
}

// ============================================================================
// FIXED WINDOW
// ============================================================================

#[tokio::test]
async fn test_fixed_window_unbounded_below_zero() {
    let store = MemoryStore::new();

    let mut returns = Vec::new();
    for _ in 0..5 {
        returns.push(fixed_window_decrement(&store, "fresh", 3, WINDOW).await.unwrap());
    }

    assert_eq!(returns, vec![2, 1, 0, -1, -2]);
    assert_eq!(stored(&store, "fresh").await, -2);
}

#[tokio::test]
async fn test_fixed_window_keys_are_independent() {
    let store = MemoryStore::new();

    assert_eq!(fixed_window_decrement(&store, "a", 2, WINDOW).await.unwrap(), 1);
    assert_eq!(fixed_window_decrement(&store, "b", 5, WINDOW).await.unwrap(), 4);
    assert_eq!(fixed_window_decrement(&store, "a", 2, WINDOW).await.unwrap(), 0);
}

#[tokio::test]
async fn test_fixed_window_default_batch_matches_pipelined() {
    // GatedStore relies on the trait's default two-command batch
    let gated = GatedStore::new(1);
    let memory = MemoryStore::new();

    for _ in 0..4 {
        let a = fixed_window_decrement(&gated, "k", 2, WINDOW).await.unwrap();
        let b = fixed_window_decrement(&memory, "k", 2, WINDOW).await.unwrap();
        assert_eq!(a, b);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fixed_window_concurrent_callers_spend_exactly_once_each() {
    let limiter = RateLimiter::new(Arc::new(MemoryStore::new()));
    let callers = 50;

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.fixed_window("shared", 10, WINDOW).await.unwrap() })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if RateDecision::from_remaining(handle.await.unwrap()).is_allowed() {
            allowed += 1;
        }
    }

    // Decrements are atomic, so the stored counter reflects every caller.
    assert_eq!(stored(limiter.store(), "shared").await, 10 - callers);
    // Reads are separate round trips, so fewer callers may observe >= 0 than the budget.
    assert!(allowed <= 10);
}

#[tokio::test]
async fn test_fixed_window_resets_after_ttl() {
    let store = MemoryStore::new();
    let window = Duration::from_millis(40);

    for _ in 0..4 {
        fixed_window_decrement(&store, "burst", 2, window).await.unwrap();
    }
    assert_eq!(stored(&store, "burst").await, -2);

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(fixed_window_decrement(&store, "burst", 2, window).await.unwrap(), 1);
}

// ============================================================================
// BOUNDED COUNTING
// ============================================================================

#[tokio::test]
async fn test_bounded_sequence_stops_at_floor() {
    let store = MemoryStore::new();

    let first = bounded_counting_decrement(&store, "quota", 10, 4, WINDOW).await.unwrap();
    let second = bounded_counting_decrement(&store, "quota", 10, 4, WINDOW).await.unwrap();
    let third = bounded_counting_decrement(&store, "quota", 10, 4, WINDOW).await.unwrap();

    assert_eq!(vec![first, second, third], vec![6, 2, -2]);
    assert_eq!(stored(&store, "quota").await, 2);

    // Further refusals still do not touch the counter
    assert_eq!(
        bounded_counting_decrement(&store, "quota", 10, 4, WINDOW).await.unwrap(),
        -2
    );
    assert_eq!(stored(&store, "quota").await, 2);

    // A smaller request still fits
    assert_eq!(
        bounded_counting_decrement(&store, "quota", 10, 2, WINDOW).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_bounded_resets_after_ttl() {
    let store = MemoryStore::new();
    let window = Duration::from_millis(40);

    assert_eq!(bounded_counting_decrement(&store, "k", 3, 3, window).await.unwrap(), 0);
    assert_eq!(bounded_counting_decrement(&store, "k", 3, 3, window).await.unwrap(), -3);

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(bounded_counting_decrement(&store, "k", 3, 3, window).await.unwrap(), 0);
}

#[tokio::test]
async fn test_bounded_race_two_callers_overspend() {
    let store = GatedStore::new(2);

    let (a, b) = tokio::join!(
        bounded_counting_decrement(&store, "race", 5, 5, WINDOW),
        bounded_counting_decrement(&store, "race", 5, 5, WINDOW),
    );

    // Both observed current = 5 and both decided to spend
    assert_eq!(a.unwrap(), 0);
    assert_eq!(b.unwrap(), 0);
    assert_eq!(stored(&store.inner, "race").await, -5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bounded_race_under_stress() {
    let callers = 16;
    let limiter = RateLimiter::new(Arc::new(GatedStore::new(callers)));

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.bounded_count("stress", 5, 5, WINDOW).await.unwrap() })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 0);
    }

    assert_eq!(
        stored(&limiter.store().inner, "stress").await,
        5 - 5 * callers as i64
    );
}
