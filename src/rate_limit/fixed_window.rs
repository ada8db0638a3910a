//! Fixed-window decrement limiter.
//!
//! **Algorithm** (one pipelined batch, then one read):
//! 1. `SET key budget NX PX window` - creates the window on first use, never overwrites
//! 2. `DECR key` - applied unconditionally
//! 3. `GET key` - the post-decrement remaining budget
//!
//! No floor is enforced: once the budget is spent the counter keeps going
//! negative until the window expires and the next call recreates it.

use log::trace;
use std::time::Duration;

use super::read_counter;
use crate::error::CacheResult;
use crate::store::KeyValueStore;

/// Spend one unit of `budget` under `key` for the current `window`.
///
/// Returns the remaining budget; negative values mean "over budget".
pub async fn fixed_window_decrement<S>(
    store: &S,
    key: &str,
    budget: i64,
    window: Duration,
) -> CacheResult<i64>
where
    S: KeyValueStore + ?Sized,
{
    store
        .set_if_absent_then_decrement(key, budget, Some(window))
        .await?;

    let remaining = read_counter(store, key).await?;
    trace!(
        "fixed window '{}': remaining {} of {} ({}ms window)",
        key,
        remaining,
        budget,
        window.as_millis()
    );
    Ok(remaining)
}
