//! Cache and reporter configuration.
//!
//! Defaults match a production deployment: statistics are recorded and a
//! reporter snapshots them once per second. Every field can be overridden
//! through builder setters or through environment variables:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `CACHER_RECORD_STATISTICS` | `true`/`false`/`1`/`0` |
//! | `CACHER_REPORTER_ENABLED` | `true`/`false`/`1`/`0` |
//! | `CACHER_REPORT_INTERVAL_MS` | reporter period in milliseconds, > 0 |

use std::time::Duration;

use crate::error::{CacheError, CacheResult};

pub const ENV_RECORD_STATISTICS: &str = "CACHER_RECORD_STATISTICS";
pub const ENV_REPORTER_ENABLED: &str = "CACHER_REPORTER_ENABLED";
pub const ENV_REPORT_INTERVAL_MS: &str = "CACHER_REPORT_INTERVAL_MS";

/// Configuration for the periodic statistics reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Interval between two emissions
    pub interval: Duration,
    /// Whether the reporter task is spawned at all
    pub enabled: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            enabled: true,
        }
    }
}

/// Configuration for [`CacheWrapper`](crate::cache::CacheWrapper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Record per-key hits, misses and hit latency
    pub record_statistics: bool,
    /// Background reporter settings
    pub reporter: ReporterConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            record_statistics: true,
            reporter: ReporterConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable statistics recording.
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.record_statistics = enabled;
        self
    }

    /// Set the reporter interval.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.reporter.interval = interval;
        self
    }

    /// Enable or disable the background reporter.
    pub fn with_reporter(mut self, enabled: bool) -> Self {
        self.reporter.enabled = enabled;
        self
    }

    /// Build a config from the process environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> CacheResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> CacheResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_RECORD_STATISTICS) {
            config.record_statistics = parse_bool(ENV_RECORD_STATISTICS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REPORTER_ENABLED) {
            config.reporter.enabled = parse_bool(ENV_REPORTER_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REPORT_INTERVAL_MS) {
            let ms: u64 = raw.trim().parse().map_err(|e| {
                CacheError::Config(format!("{}={:?}: {}", ENV_REPORT_INTERVAL_MS, raw, e))
            })?;
            if ms == 0 {
                return Err(CacheError::Config(format!(
                    "{} must be greater than zero",
                    ENV_REPORT_INTERVAL_MS
                )));
            }
            config.reporter.interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, raw: &str) -> CacheResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CacheError::Config(format!(
            "{}={:?} is not a boolean",
            name, raw
        ))),
    }
}
