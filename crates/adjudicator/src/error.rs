use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum characters of a raw response kept for diagnostics.
pub const SNIPPET_LIMIT: usize = 256;

/// Failures of a single adjudication attempt or of the whole call.
///
/// These are recovered locally by the escalator; none of them aborts a job.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum AdjudicatorError {
    #[error("adjudicator timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("malformed adjudicator response: {reason}")]
    Malformed { reason: String, snippet: String },
    #[error("rate limited: {message}")]
    RateLimited { message: String },
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("upstream error{}: {message}", fmt_status(.status))]
    Upstream { status: Option<u16>, message: String },
    #[error("circuit breaker open")]
    CircuitOpen,
    #[error("call budget exhausted")]
    BudgetExhausted,
}

/// An [`AdjudicatorConfig`](crate::AdjudicatorConfig) that cannot be used.
///
/// Messages name the offending field relative to the tier section.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidAdjudicatorConfig {
    #[error("call_timeout must be greater than zero")]
    ZeroCallTimeout,
    #[error("circuit_breaker.failure_threshold must be >= 1")]
    ZeroFailureThreshold,
    #[error("rate_limit.requests_per_second must be finite and > 0")]
    InvalidRequestRate,
    #[error("rate_limit.burst_size must be >= 1")]
    ZeroBurstSize,
    #[error("retry.base_delay must not exceed retry.max_delay")]
    BaseDelayAboveMax,
    #[error("endpoint must not be blank")]
    BlankEndpoint,
}

impl AdjudicatorError {
    pub fn transport(message: impl Into<String>) -> Self {
        AdjudicatorError::Transport {
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        AdjudicatorError::RateLimited {
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        AdjudicatorError::Malformed {
            reason: reason.into(),
            snippet: snippet(raw),
        }
    }

    /// Stable short name used in logs and audit records.
    pub fn class(&self) -> &'static str {
        match self {
            AdjudicatorError::Timeout { .. } => "timeout",
            AdjudicatorError::Malformed { .. } => "malformed",
            AdjudicatorError::RateLimited { .. } => "rate_limited",
            AdjudicatorError::Transport { .. } => "transport",
            AdjudicatorError::Upstream { .. } => "upstream",
            AdjudicatorError::CircuitOpen => "circuit_open",
            AdjudicatorError::BudgetExhausted => "budget_exhausted",
        }
    }

    /// Whether another attempt may succeed. Client errors (4xx other than
    /// 429), an open circuit and an empty budget are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdjudicatorError::Timeout { .. }
            | AdjudicatorError::Malformed { .. }
            | AdjudicatorError::RateLimited { .. }
            | AdjudicatorError::Transport { .. } => true,
            AdjudicatorError::Upstream { status, .. } => status.is_none_or(|s| s >= 500),
            AdjudicatorError::CircuitOpen | AdjudicatorError::BudgetExhausted => false,
        }
    }

    /// Raw response excerpt, when one was captured.
    pub fn snippet(&self) -> Option<&str> {
        match self {
            AdjudicatorError::Malformed { snippet, .. } => Some(snippet),
            AdjudicatorError::Upstream { message, .. } => Some(message),
            _ => None,
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" {s}")).unwrap_or_default()
}

/// Truncate `raw` to [`SNIPPET_LIMIT`] characters on a char boundary.
pub fn snippet(raw: &str) -> String {
    match raw.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}…", &raw[..cut]),
        None => raw.to_string(),
    }
}
