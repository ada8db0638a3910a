//! # cacher
//!
//! Instrumented caching facade and rate limiters over a remote key-value store.
//!
//! ## Components
//! - [`store`]: the [`KeyValueStore`] contract and the in-process [`MemoryStore`]
//! - [`stats`]: lock-light hit/miss counters and hit latency accounting
//! - [`cache`]: [`CacheWrapper`], the statistics-tracking read/write facade
//! - [`rate_limit`]: fixed-window and bounded counting limiters
//! - [`reporter`]: periodic background emission of statistics
//!
//! ## Wiring
//! The store client is created once by the application and injected:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cacher::{CacheConfig, CacheWrapper, MemoryStore};
//!
//! # async fn example() {
//! let store = Arc::new(MemoryStore::new());
//! let cache = CacheWrapper::start(store, CacheConfig::default());
//!
//! let value = cache
//!     .compute_if_absent("greeting", || async { "hello".to_string() })
//!     .await;
//! assert_eq!(value, "hello");
//!
//! cache.shutdown().await;
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod reporter;
pub mod stats;
pub mod store;

pub use cache::CacheWrapper;
pub use config::{CacheConfig, ReporterConfig};
pub use error::{CacheError, CacheResult};
pub use rate_limit::{
    bounded_counting_decrement, fixed_window_decrement, RateDecision, RateLimiter,
};
pub use reporter::{LogSink, StatsReport, StatsReporter, StatsSink};
pub use stats::{CacheStatistics, KeyStatistics, LatencyAccumulator, StatisticsSnapshot, StatsCounter};
pub use store::{KeyValueStore, MemoryStore};
