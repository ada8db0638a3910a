//! Rate limiting built from the store's atomic counter operations.
//!
//! Both limiters keep a single integer "remaining budget" per key, created
//! with a TTL on first use in a window and recreated after it expires:
//!
//! - [`fixed_window_decrement`]: always decrements, may go negative
//! - [`bounded_counting_decrement`]: refuses to decrement below zero (racy, see module docs)

pub mod bounded;
pub mod fixed_window;

pub use bounded::bounded_counting_decrement;
pub use fixed_window::fixed_window_decrement;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};
use crate::store::KeyValueStore;

/// Interpretation of a signed remaining budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Within budget; `remaining` units left in the window
    Allowed { remaining: u64 },
    /// Over budget by `deficit` units
    Exceeded { deficit: u64 },
}

impl RateDecision {
    pub fn from_remaining(remaining: i64) -> Self {
        if remaining >= 0 {
            RateDecision::Allowed {
                remaining: remaining.unsigned_abs(),
            }
        } else {
            RateDecision::Exceeded {
                deficit: remaining.unsigned_abs(),
            }
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Limiter bound to one store.
pub struct RateLimiter<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Clone for RateLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> RateLimiter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// See [`fixed_window_decrement`].
    pub async fn fixed_window(&self, key: &str, budget: i64, window: Duration) -> CacheResult<i64> {
        fixed_window_decrement(self.store.as_ref(), key, budget, window).await
    }

    /// See [`bounded_counting_decrement`].
    pub async fn bounded_count(
        &self,
        key: &str,
        budget: i64,
        decrement: i64,
        window: Duration,
    ) -> CacheResult<i64> {
        bounded_counting_decrement(self.store.as_ref(), key, budget, decrement, window).await
    }
}

/// Read a limiter counter back as an integer.
pub(crate) async fn read_counter<S>(store: &S, key: &str) -> CacheResult<i64>
where
    S: KeyValueStore + ?Sized,
{
    let raw = store
        .get(key)
        .await?
        .ok_or_else(|| CacheError::CounterMissing(key.to_string()))?;

    raw.trim().parse().map_err(|_| CacheError::InvalidCounter {
        key: key.to_string(),
        value: raw.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_decision_from_remaining() {
        assert_eq!(
            RateDecision::from_remaining(3),
            RateDecision::Allowed { remaining: 3 }
        );
        assert!(RateDecision::from_remaining(0).is_allowed());
        assert_eq!(
            RateDecision::from_remaining(-2),
            RateDecision::Exceeded { deficit: 2 }
        );
        assert!(!RateDecision::from_remaining(-1).is_allowed());
    }

    #[tokio::test]
    async fn test_limiter_facade() {
        let limiter = RateLimiter::new(Arc::new(MemoryStore::new()));
        let window = Duration::from_secs(60);

        assert_eq!(limiter.fixed_window("a", 2, window).await.unwrap(), 1);
        assert_eq!(limiter.bounded_count("b", 3, 2, window).await.unwrap(), 1);
        assert_eq!(limiter.bounded_count("b", 3, 2, window).await.unwrap(), -1);

        let cloned = limiter.clone();
        assert_eq!(cloned.fixed_window("a", 2, window).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_counter_missing() {
        let store = MemoryStore::new();
        let err = read_counter(&store, "nothing").await.unwrap_err();
        assert!(matches!(err, CacheError::CounterMissing(_)));
    }
}
