use adjudicator::InvalidAdjudicatorConfig;
use blocking::BlockingError;
use matcher::MatchError;
use normalize::NormalizeError;
use similarity::SimilarityError;
use thiserror::Error;

use crate::audit::AuditError;

/// Errors that can occur when loading or compiling a job configuration.
///
/// All of these surface before any name is scored.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("normalization: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("similarity: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("blocking: {0}")]
    Blocking(#[from] BlockingError),

    #[error("matching: {0}")]
    Match(#[from] MatchError),

    #[error("validation error: escalation.{tier}.{source}")]
    Adjudicator {
        tier: &'static str,
        #[source]
        source: InvalidAdjudicatorConfig,
    },
}

/// Errors that abort a whole job. Single-pair failures never do.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid candidate set: {0}")]
    Candidates(#[from] BlockingError),

    #[error("match engine error: {0}")]
    Match(#[from] MatchError),

    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("worker pool error: {0}")]
    WorkerPool(String),
}
