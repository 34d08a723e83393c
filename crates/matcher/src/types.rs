use blocking::{BlockKey, BlockingError};
use normalize::NormalizedName;
use serde::{Deserialize, Serialize};
use similarity::{SimilarityError, SimilarityVector};
use thiserror::Error;

/// Matching knobs shared by every query in a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchConfig {
    /// Number of ranked candidates kept per query.
    pub top_k: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.top_k == 0 {
            return Err(MatchError::InvalidConfig(
                "top_k must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// One scored (query, candidate) pair with its rank inside the query's block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub query: NormalizedName,
    pub candidate_id: String,
    /// Position of the candidate in the job's input order; the tie-break key.
    pub candidate_index: usize,
    pub candidate: NormalizedName,
    pub vector: SimilarityVector,
    pub composite: f64,
    /// 1-based.
    pub rank: usize,
}

/// Every pair scored for one query, ranked best first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredQuery {
    pub query: NormalizedName,
    pub block_key: BlockKey,
    /// The query's block was empty and the global block was scanned instead.
    pub used_fallback: bool,
    pub candidates: Vec<MatchCandidate>,
}

impl ScoredQuery {
    pub fn best(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }

    pub fn top(&self, k: usize) -> &[MatchCandidate] {
        &self.candidates[..k.min(self.candidates.len())]
    }

    pub fn into_top(mut self, k: usize) -> Vec<MatchCandidate> {
        self.candidates.truncate(k);
        self.candidates
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    #[error("similarity error: {0}")]
    Similarity(#[from] SimilarityError),
    #[error("blocking error: {0}")]
    Blocking(#[from] BlockingError),
}
