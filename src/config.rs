//! YAML job configuration.
//!
//! One file describes every stage of a resolution job. Each section has
//! defaults, so `version: "1.0"` alone is a valid document. Everything is
//! validated on load; a bad weight set or threshold ordering is reported
//! before any name is scored.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "payments-to-prescribers"
//!
//! normalization:
//!   abbreviations: { st: saint, hosp: hospital, mem: memorial }
//!   suffixes: [inc, corp, corporation, llc, ltd]
//!   stopwords: [the, of, and]
//!
//! similarity:
//!   exact_match: 0.10
//!   edit_ratio: 0.15
//!   partial_ratio: 0.15
//!   token_sort_ratio: 0.15
//!   token_set_ratio: 0.25
//!   phonetic: 0.10
//!   first_token_match: 0.10
//!
//! blocking:
//!   strategy: { type: first_character }
//!   global_block_threshold: 64
//!
//! matching:
//!   top_k: 5
//!
//! escalation:
//!   conclusive_high: 90
//!   conclusive_low: 50
//!   tier2_min_confidence: 70
//!   unadjudicated_accept: 75
//!   tier2:
//!     max_calls: 500
//!     call_timeout: 10000
//!   tier3:
//!     max_calls: 50
//!     call_timeout: 30000
//!
//! workers:
//!   chunk_size: 256
//!   cpu_pool_size: 0      # 0 = available cores
//!   io_concurrency: 10
//!
//! audit:
//!   record_all_pairs: true
//! ```

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use adjudicator::AdjudicatorConfig;
use blocking::BlockingConfig;
use matcher::MatchConfig;
use normalize::{NormalizeConfig, Normalizer};
use serde::{Deserialize, Serialize};
use similarity::Weights;

use crate::error::ConfigError;

/// Top-level job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub normalization: NormalizeConfig,

    /// Composite score weights; must sum to 1.0.
    #[serde(default)]
    pub similarity: Weights,

    #[serde(default)]
    pub blocking: BlockingConfig,

    #[serde(default)]
    pub matching: MatchConfig,

    #[serde(default)]
    pub escalation: EscalationConfig,

    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            normalization: NormalizeConfig::default(),
            similarity: Weights::default(),
            blocking: BlockingConfig::default(),
            matching: MatchConfig::default(),
            escalation: EscalationConfig::default(),
            workers: WorkerConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl JobConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: JobConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section. Configs built in code should call this (or
    /// [`JobConfig::prepare`], which does) before use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigError::UnsupportedVersion(v.to_string())),
        }?;

        Normalizer::new(&self.normalization)?;
        self.similarity.validate()?;
        self.blocking.validate()?;
        self.matching.validate()?;
        self.escalation.validate()?;
        self.workers.validate()?;

        Ok(())
    }

    /// Validate and compile into the immutable form shared by every worker.
    pub fn prepare(self) -> Result<PreparedJob, ConfigError> {
        self.validate()?;
        let normalizer = Arc::new(Normalizer::new(&self.normalization)?);
        Ok(PreparedJob {
            config: self,
            normalizer,
        })
    }
}

/// A validated configuration plus its compiled normalizer.
#[derive(Debug, Clone)]
pub struct PreparedJob {
    config: JobConfig,
    normalizer: Arc<Normalizer>,
}

impl PreparedJob {
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Arc<Normalizer> {
        &self.normalizer
    }

    pub fn weights(&self) -> Weights {
        self.config.similarity
    }

    pub fn escalation(&self) -> &EscalationConfig {
        &self.config.escalation
    }

    pub fn workers(&self) -> &WorkerConfig {
        &self.config.workers
    }
}

/// Escalation thresholds and per-tier adjudicator settings.
///
/// Composite scores at or above `conclusive_high`, or below
/// `conclusive_low`, are decided without an adjudicator. Everything in
/// between is ambiguous and escalated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub conclusive_high: f64,
    pub conclusive_low: f64,
    /// Tier-2 verdicts below this confidence go on to tier 3.
    pub tier2_min_confidence: u8,
    /// Composite cut-off for verdicts reached without any adjudicator.
    pub unadjudicated_accept: f64,
    /// Reasoning adjudicator.
    pub tier2: AdjudicatorConfig,
    /// Evidence-gathering adjudicator.
    pub tier3: AdjudicatorConfig,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            conclusive_high: 90.0,
            conclusive_low: 50.0,
            tier2_min_confidence: 70,
            unadjudicated_accept: 75.0,
            tier2: AdjudicatorConfig::default(),
            tier3: AdjudicatorConfig::default().with_max_calls(100),
        }
    }
}

impl EscalationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.conclusive_high) || !in_range(self.conclusive_low) {
            return Err(ConfigError::Validation(
                "escalation thresholds must be within 0..=100".to_string(),
            ));
        }
        if self.conclusive_low > self.conclusive_high {
            return Err(ConfigError::Validation(format!(
                "escalation.conclusive_low ({}) must not exceed conclusive_high ({})",
                self.conclusive_low, self.conclusive_high
            )));
        }
        if !in_range(self.unadjudicated_accept) {
            return Err(ConfigError::Validation(
                "escalation.unadjudicated_accept must be within 0..=100".to_string(),
            ));
        }
        if self.tier2_min_confidence > 100 {
            return Err(ConfigError::Validation(
                "escalation.tier2_min_confidence must be <= 100".to_string(),
            ));
        }
        self.tier2
            .validate()
            .map_err(|source| ConfigError::Adjudicator {
                tier: "tier2",
                source,
            })?;
        self.tier3
            .validate()
            .map_err(|source| ConfigError::Adjudicator {
                tier: "tier3",
                source,
            })?;
        Ok(())
    }
}

/// Pool sizes and chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Queries per chunk.
    pub chunk_size: usize,
    /// CPU worker threads; 0 means one per available core.
    pub cpu_pool_size: usize,
    /// Maximum adjudicator calls in flight across the job.
    pub io_concurrency: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            cpu_pool_size: 0,
            io_concurrency: 10,
        }
    }
}

impl WorkerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "workers.chunk_size must be >= 1".to_string(),
            ));
        }
        if self.io_concurrency == 0 {
            return Err(ConfigError::Validation(
                "workers.io_concurrency must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved CPU pool size.
    pub fn cpu_threads(&self) -> usize {
        if self.cpu_pool_size > 0 {
            return self.cpu_pool_size;
        }
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Record every scored pair of a block, not just the top-K.
    pub record_all_pairs: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            record_all_pairs: true,
        }
    }
}
