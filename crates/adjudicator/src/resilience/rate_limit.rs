//! Token-bucket rate limiting for adjudicator endpoints.
//!
//! Async: waiting for a token sleeps on the tokio timer and never holds the
//! bucket lock across the wait.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained rate.
    pub requests_per_second: f64,
    /// Tokens available instantly.
    pub burst_size: u64,
    /// Longest wait for a token (0 = fail immediately).
    #[serde(with = "crate::serde_millis")]
    pub max_wait: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            burst_size: 10,
            max_wait: Duration::from_secs(5),
        }
    }
}

impl RateLimitConfig {
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_burst_size(mut self, burst: u64) -> Self {
        self.burst_size = burst;
        self
    }

    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = wait;
        self
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    bucket: Mutex<Bucket>,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(Bucket {
                tokens: config.burst_size as f64,
                last_update: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refill and take one token if available; otherwise return the time
    /// until the next token.
    fn take(&self) -> Result<(), Duration> {
        let mut bucket = self.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_update).as_secs_f64();
        bucket.last_update = now;
        bucket.tokens = (bucket.tokens + elapsed * self.config.requests_per_second)
            .min(self.config.burst_size as f64);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else if self.config.requests_per_second > 0.0 {
            let secs = (1.0 - bucket.tokens) / self.config.requests_per_second;
            Err(Duration::from_secs_f64(secs.min(0.1)))
        } else {
            Err(Duration::from_millis(100))
        }
    }

    /// Wait up to `max_wait` for a token. Returns `false` on timeout.
    pub async fn acquire(&self) -> bool {
        let start = Instant::now();
        loop {
            let wait = match self.take() {
                Ok(()) => return true,
                Err(wait) => wait,
            };
            let waited = start.elapsed();
            if waited >= self.config.max_wait {
                return false;
            }
            tokio::time::sleep(wait.min(self.config.max_wait - waited)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_full_and_drains() {
        let bucket = TokenBucket::new(
            RateLimitConfig::default()
                .with_burst_size(3)
                .with_requests_per_second(0.001)
                .with_max_wait(Duration::ZERO),
        );
        for _ in 0..3 {
            assert!(bucket.acquire().await);
        }
        assert!(!bucket.acquire().await);
    }

    #[tokio::test]
    async fn acquire_waits_for_refill() {
        let bucket = TokenBucket::new(
            RateLimitConfig::default()
                .with_requests_per_second(100.0)
                .with_burst_size(1)
                .with_max_wait(Duration::from_millis(500)),
        );
        assert!(bucket.acquire().await);
        let start = Instant::now();
        assert!(bucket.acquire().await);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn acquire_gives_up_after_max_wait() {
        let bucket = TokenBucket::new(
            RateLimitConfig::default()
                .with_requests_per_second(0.1)
                .with_burst_size(1)
                .with_max_wait(Duration::from_millis(30)),
        );
        assert!(bucket.acquire().await);
        let start = Instant::now();
        assert!(!bucket.acquire().await);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
