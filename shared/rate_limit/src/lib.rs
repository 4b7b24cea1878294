//! In-memory sliding-window rate limiting, keyed per `(tenant, identifier)`.

pub mod limiter;
pub mod memory_limiter;

pub use limiter::{KeyGenerator, RateLimitError, RateLimitResult, RateLimiter};
pub use memory_limiter::InMemoryRateLimiter;
