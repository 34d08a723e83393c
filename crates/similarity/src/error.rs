use thiserror::Error;

/// Errors raised while validating similarity configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("weights must sum to 1.0 (±1e-6), got {sum}")]
    WeightSum { sum: f64 },
    #[error("weight for {metric} must be finite and non-negative, got {value}")]
    InvalidWeight { metric: &'static str, value: f64 },
    #[error("cannot boost {metric} by {delta}: {reason}")]
    InvalidBoost {
        metric: &'static str,
        delta: f64,
        reason: &'static str,
    },
}
