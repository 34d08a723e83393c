//! Resilience policies owned by the adjudicator client: retry with
//! exponential backoff and jitter, a circuit breaker, and a token-bucket
//! rate limiter.
//!
//! None of these know anything about matching; the client composes them
//! around each external call.

mod circuit_breaker;
mod rate_limit;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limit::{RateLimitConfig, TokenBucket};
pub use retry::RetryConfig;
