//! In-memory rate limiter using the sliding-window log algorithm.

use crate::limiter::{RateLimitError, RateLimitResult, RateLimiter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct RateLimitEntry {
    timestamps: Vec<u64>,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self { timestamps: Vec::new() }
    }

    fn cleanup(&mut self, window_start: u64) {
        self.timestamps.retain(|&ts| ts >= window_start);
    }
}

/// Single-instance sliding-window limiter. Sufficient per the concurrency
/// model: one process owns the counters, no distributed backing is required.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    store: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    max_entries: usize,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(HashMap::new())), max_entries: 10_000 }
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self { store: Arc::new(RwLock::new(HashMap::new())), max_entries }
    }

    fn now_secs() -> u64 {
        SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_secs()
    }

    /// Drops stale entries once the map grows past `max_entries`, so a
    /// long-running process doesn't accumulate one entry per distinct
    /// attacker forever.
    pub async fn cleanup_stale_entries(&self, max_age_secs: u64) {
        let mut store = self.store.write().await;
        if store.len() > self.max_entries {
            let now = Self::now_secs();
            store.retain(|_, entry| {
                entry.timestamps.iter().any(|&ts| now.saturating_sub(ts) < max_age_secs)
            });
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryRateLimiter {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), max_entries: self.max_entries }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = Self::now_secs();
        let window_secs = window.as_secs();
        let window_start = now.saturating_sub(window_secs);
        let reset_at = now + window_secs;

        let mut store = self.store.write().await;
        let entry = store.entry(key.to_string()).or_insert_with(RateLimitEntry::new);
        entry.cleanup(window_start);

        let current_count = entry.timestamps.len() as u32;

        if current_count >= max_requests {
            tracing::warn!(key, max_requests, current_count, "rate limit exceeded");
            Ok(RateLimitResult::denied(max_requests, reset_at))
        } else {
            entry.timestamps.push(now);
            let remaining = max_requests.saturating_sub(current_count + 1);
            Ok(RateLimitResult::allowed(max_requests, remaining, reset_at))
        }
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn get_count(&self, key: &str) -> Result<u32, RateLimitError> {
        let now = Self::now_secs();
        let store = self.store.read().await;
        Ok(match store.get(key) {
            Some(entry) => {
                let window_start = now.saturating_sub(3600);
                entry.timestamps.iter().filter(|&&ts| ts >= window_start).count() as u32
            },
            None => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_limit_then_denies() {
        let limiter = InMemoryRateLimiter::new();
        let key = "tenant-a:user@example.com";
        let window = Duration::from_secs(60);

        for i in 0..3 {
            let result = limiter.check_rate_limit(key, 3, window).await.unwrap();
            assert!(result.allowed, "request {} should be allowed", i + 1);
            assert_eq!(result.remaining, 2 - i);
        }

        let result = limiter.check_rate_limit(key, 3, window).await.unwrap();
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
    }

    #[tokio::test]
    async fn reset_clears_the_window() {
        let limiter = InMemoryRateLimiter::new();
        let key = "tenant-a:reset-me";
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            limiter.check_rate_limit(key, 3, window).await.unwrap();
        }
        assert!(!limiter.check_rate_limit(key, 3, window).await.unwrap().allowed);

        limiter.reset(key).await.unwrap();
        assert!(limiter.check_rate_limit(key, 3, window).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_interfere() {
        let limiter = InMemoryRateLimiter::new();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            limiter.check_rate_limit("tenant-a:attacker", 3, window).await.unwrap();
        }

        let result = limiter.check_rate_limit("tenant-b:attacker", 3, window).await.unwrap();
        assert!(result.allowed);
    }
}
