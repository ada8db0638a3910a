//! Cache statistics collected without perturbing request latency.
//!
//! - [`StatsCounter`]: per-key monotonic counters (RwLock map of atomic cells)
//! - [`LatencyAccumulator`]: total/count pair for hit latency
//! - [`CacheStatistics`]: hits + misses + latency for one wrapper
//! - [`KeyStatistics`], [`StatisticsSnapshot`]: read-side value types

pub mod counter;
pub mod latency;
pub mod recorder;
pub mod snapshot;

pub use counter::StatsCounter;
pub use latency::LatencyAccumulator;
pub use recorder::CacheStatistics;
pub use snapshot::{KeyStatistics, StatisticsSnapshot};
