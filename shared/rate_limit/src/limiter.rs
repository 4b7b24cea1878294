//! Rate limiter trait and supporting types.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp when the window resets.
    pub reset_at: u64,
    pub retry_after: u64,
}

impl RateLimitResult {
    pub fn allowed(limit: u32, remaining: u32, reset_at: u64) -> Self {
        let retry_after = reset_at.saturating_sub(now_secs());
        Self { allowed: true, limit, remaining, reset_at, retry_after }
    }

    pub fn denied(limit: u32, reset_at: u64) -> Self {
        let retry_after = reset_at.saturating_sub(now_secs());
        Self { allowed: false, limit, remaining: 0, reset_at, retry_after }
    }
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("internal rate limiter error: {0}")]
    Internal(String),
}

/// A sliding-window attempt counter, keyed by an opaque string the caller
/// builds with `KeyGenerator`.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError>;

    async fn reset(&self, key: &str) -> Result<(), RateLimitError>;

    async fn get_count(&self, key: &str) -> Result<u32, RateLimitError>;
}

/// Builds rate-limit keys. Per the per-(tenant, identifier) policy, every key
/// is scoped by tenant so one tenant's attackers can't exhaust another
/// tenant's budget.
pub struct KeyGenerator;

impl KeyGenerator {
    /// Key scoped to a tenant and a case-insensitive identifier (email or
    /// username). The identifier is hashed so raw emails never sit in memory
    /// as map keys.
    pub fn tenant_identifier_key(prefix: &str, tenant_id: &str, identifier: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(tenant_id.as_bytes());
        hasher.update(b":");
        hasher.update(identifier.to_lowercase().as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{prefix}:{}", &hash[..16])
    }
}
