//! Bounded counting limiter.
//!
//! **Algorithm**:
//! 1. `SET key budget NX PX window`
//! 2. `GET key` -> `current`
//! 3. `new = current - decrement`
//! 4. `new < 0`: report `new` and leave the stored counter at `current`
//! 5. otherwise `DECRBY key decrement` and report `new`
//!
//! Steps 2 to 5 are separate round trips and are not atomic with respect to
//! other callers on the same key. Two callers can both read the same
//! `current`, both pass the check and both decrement, so the stored counter
//! can end below zero while each caller reported a non-negative value. A
//! caller needing a hard floor has to move the check into the store (a
//! server-side script doing compare-and-decrement).

use log::trace;
use std::time::Duration;

use super::read_counter;
use crate::error::{CacheError, CacheResult};
use crate::store::KeyValueStore;

/// Spend `decrement` units of `budget` under `key` for the current `window`,
/// refusing to spend when the result would be negative.
///
/// Returns the computed remaining budget. A negative return means the request
/// was refused and the stored counter was not touched.
pub async fn bounded_counting_decrement<S>(
    store: &S,
    key: &str,
    budget: i64,
    decrement: i64,
    window: Duration,
) -> CacheResult<i64>
where
    S: KeyValueStore + ?Sized,
{
    store
        .set_if_absent(key, &budget.to_string(), Some(window))
        .await?;

    let current = read_counter(store, key).await?;
    let new_value = current
        .checked_sub(decrement)
        .ok_or_else(|| CacheError::CounterOverflow {
            key: key.to_string(),
            delta: decrement,
        })?;

    if new_value < 0 {
        trace!(
            "bounded counter '{}': refused, {} short (stored {})",
            key,
            new_value.unsigned_abs(),
            current
        );
        return Ok(new_value);
    }

    store.decrement_by(key, decrement).await?;
    trace!("bounded counter '{}': {} -> {}", key, current, new_value);
    Ok(new_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_refuses_without_mutating() {
        let store = MemoryStore::new();
        let window = Duration::from_secs(60);

        let first = bounded_counting_decrement(&store, "api", 10, 4, window).await.unwrap();
        let second = bounded_counting_decrement(&store, "api", 10, 4, window).await.unwrap();
        let third = bounded_counting_decrement(&store, "api", 10, 4, window).await.unwrap();

        assert_eq!((first, second, third), (6, 2, -2));
        assert_eq!(store.get("api").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_exact_budget_reaches_zero() {
        let store = MemoryStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(
            bounded_counting_decrement(&store, "k", 5, 5, window).await.unwrap(),
            0
        );
        assert_eq!(
            bounded_counting_decrement(&store, "k", 5, 1, window).await.unwrap(),
            -1
        );
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_non_integer_value_is_an_error() {
        let store = MemoryStore::new();
        store.set("k", "oops", None).await.unwrap();
        let err = bounded_counting_decrement(&store, "k", 5, 1, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidCounter { .. }));
    }

    #[tokio::test]
    async fn test_overflowing_decrement_is_rejected() {
        let store = MemoryStore::new();
        store.set("k", &i64::MIN.to_string(), None).await.unwrap();

        let err = bounded_counting_decrement(&store, "k", 5, 1, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::CounterOverflow { ref key, delta: 1 } if key == "k"
        ));
        assert_eq!(store.get("k").await.unwrap(), Some(i64::MIN.to_string()));
    }
}
