//! # cacher demo entry point
//!
//! Composition root: builds the store once, injects it into the cache wrapper
//! and a rate limiter, drives some traffic and shuts the reporter down.

use cacher::{CacheConfig, CacheWrapper, MemoryStore, RateDecision, RateLimiter};
use log::info;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("  cacher - instrumented cache & rate limit demo  ");
    println!("=================================================");
    println!();

    let config = CacheConfig::from_env()?;
    println!("Configuration:");
    println!("  - Record statistics: {}", config.record_statistics);
    println!("  - Reporter enabled:  {}", config.reporter.enabled);
    println!("  - Report interval:   {}ms", config.reporter.interval.as_millis());
    println!();

    // One store handle for the whole process
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(CacheWrapper::start(Arc::clone(&store), config));
    let limiter = RateLimiter::new(Arc::clone(&store));

    // Concurrent readers racing on a handful of keys
    let mut tasks = Vec::new();
    for worker in 0..8 {
        let cache = Arc::clone(&cache);
        tasks.push(tokio::spawn(async move {
            for i in 0..250 {
                let key = format!("item:{}", (worker + i) % 5);
                let fresh = format!("value-for-{}", key);
                let value = cache
                    .compute_if_absent(&key, move || async move {
                        // Stand-in for an expensive lookup
                        tokio::time::sleep(Duration::from_millis(2)).await;
                        fresh
                    })
                    .await;
                debug_assert!(!value.is_empty());
            }
        }));
    }
    for task in tasks {
        task.await?;
    }

    // Rate limiting on the same store
    for attempt in 1..=5 {
        let remaining = limiter
            .fixed_window("login:demo", 3, Duration::from_secs(60))
            .await?;
        info!(
            "login attempt {}: {:?}",
            attempt,
            RateDecision::from_remaining(remaining)
        );
    }
    for attempt in 1..=3 {
        let remaining = limiter
            .bounded_count("export:demo", 10, 4, Duration::from_secs(60))
            .await?;
        info!(
            "export attempt {}: {:?}",
            attempt,
            RateDecision::from_remaining(remaining)
        );
    }

    // Let the reporter tick at least once
    tokio::time::sleep(cache.config().reporter.interval + Duration::from_millis(100)).await;

    println!();
    println!("Statistics:");
    for (key, stats) in cache.statistics() {
        println!(
            "  - {:<10} hits: {:>5}  misses: {:>3}  hit rate: {:.1}%",
            key,
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0
        );
    }
    println!("  Average hit latency: {:.2}µs", cache.average_hit_latency());
    println!();

    cache.shutdown().await;

    println!("=================================================");
    println!("  Demo Shut Down");
    println!("=================================================");

    Ok(())
}
