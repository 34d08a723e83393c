//! Circuit breaker for adjudicator endpoints.
//!
//! After `failure_threshold` consecutive failures the breaker opens and calls
//! are refused without touching the network. Once `reset_timeout` has passed
//! a single probe is let through (half-open); its result closes or re-opens
//! the circuit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a half-open probe.
    #[serde(with = "crate::serde_millis")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    last_state_change: Instant,
    probe_in_flight: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    failure_count: AtomicU64,
    success_count: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                last_state_change: Instant::now(),
                probe_in_flight: false,
            }),
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        if inner.state != to {
            warn!(
                breaker = %self.name,
                from = ?inner.state,
                to = ?to,
                failures = self.failure_count.load(Ordering::Relaxed),
                "circuit_breaker_transition"
            );
        }
        inner.state = to;
        inner.last_state_change = Instant::now();
    }

    /// Whether a call may go out now. In half-open state only one probe is
    /// admitted until its result is recorded.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if inner.last_state_change.elapsed() >= self.config.reset_timeout {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    false
                } else {
                    inner.probe_in_flight = true;
                    true
                }
            }
        }
    }

    /// Give back a half-open probe slot that was granted but never used.
    pub fn release_probe(&self) {
        self.lock().probe_in_flight = false;
    }

    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        inner.probe_in_flight = false;
        match inner.state {
            CircuitState::HalfOpen => {
                self.failure_count.store(0, Ordering::Relaxed);
                self.transition(&mut inner, CircuitState::Closed);
            }
            CircuitState::Closed => self.failure_count.store(0, Ordering::Relaxed),
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        let mut inner = self.lock();
        inner.probe_in_flight = false;
        match inner.state {
            CircuitState::Closed => {
                if failures >= u64::from(self.config.failure_threshold) {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open),
            CircuitState::Open => {}
        }
    }

    pub fn current_state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }
}
