use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::InvalidAdjudicatorConfig;
use crate::resilience::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};

/// Per-tier adjudicator settings.
///
/// ```yaml
/// tier2:
///   max_calls: 500
///   call_timeout: 10000      # ms, hard limit per attempt
///   endpoint: https://adjudicator.internal/v1/reasoning
///   retry: { max_retries: 2, base_delay: 200 }
///   circuit_breaker: { failure_threshold: 5, reset_timeout: 30000 }
///   rate_limit: { requests_per_second: 5.0, burst_size: 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjudicatorConfig {
    /// Total calls (attempts included) this tier may make in one job.
    pub max_calls: u32,
    #[serde(with = "crate::serde_millis")]
    pub call_timeout: Duration,
    /// HTTP endpoint; only used with the `http` feature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Value for the `Authorization` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header: Option<String>,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for AdjudicatorConfig {
    fn default() -> Self {
        Self {
            max_calls: 1_000,
            call_timeout: Duration::from_secs(10),
            endpoint: None,
            auth_header: None,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AdjudicatorConfig {
    pub fn with_max_calls(mut self, max_calls: u32) -> Self {
        self.max_calls = max_calls;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Reports the first invalid field.
    pub fn validate(&self) -> Result<(), InvalidAdjudicatorConfig> {
        if self.call_timeout.is_zero() {
            return Err(InvalidAdjudicatorConfig::ZeroCallTimeout);
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(InvalidAdjudicatorConfig::ZeroFailureThreshold);
        }
        let rps = self.rate_limit.requests_per_second;
        if !rps.is_finite() || rps <= 0.0 {
            return Err(InvalidAdjudicatorConfig::InvalidRequestRate);
        }
        if self.rate_limit.burst_size == 0 {
            return Err(InvalidAdjudicatorConfig::ZeroBurstSize);
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(InvalidAdjudicatorConfig::BaseDelayAboveMax);
        }
        if let Some(endpoint) = &self.endpoint {
            if endpoint.trim().is_empty() {
                return Err(InvalidAdjudicatorConfig::BlankEndpoint);
            }
        }
        Ok(())
    }
}
