use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AdjudicatorError;

/// Resolution tier. Tier 1 is the deterministic composite score; tiers 2 and
/// 3 are external adjudicators of increasing cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Deterministic,
    Reasoning,
    Evidence,
}

impl Tier {
    pub fn number(self) -> u8 {
        match self {
            Tier::Deterministic => 1,
            Tier::Reasoning => 2,
            Tier::Evidence => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Deterministic => "deterministic",
            Tier::Reasoning => "reasoning",
            Tier::Evidence => "evidence",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier{}:{}", self.number(), self.as_str())
    }
}

/// Identity of a (query, candidate) pair within a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId {
    pub query_id: String,
    pub candidate_id: String,
}

impl PairId {
    pub fn new(query_id: impl Into<String>, candidate_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            candidate_id: candidate_id.into(),
        }
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.query_id, self.candidate_id)
    }
}

/// What an adjudicator is asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationRequest {
    pub pair_id: PairId,
    pub name_a: String,
    pub name_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Composite score of the pair, for adjudicators that want a prior.
    pub composite: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: String,
    pub url: String,
    pub excerpt: String,
}

/// A schema-validated adjudicator response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub confidence: u8,
    pub same_entity: bool,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

/// One network attempt made while adjudicating a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAttempt {
    /// 1-based.
    pub attempt: u32,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AdjudicatorError>,
}

/// A trusted verdict together with what it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationResult {
    pub pair_id: PairId,
    pub tier: Tier,
    pub confidence: u8,
    pub same_entity: bool,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
    /// Calls charged against the tier budget.
    pub calls: u32,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationFailure {
    pub pair_id: PairId,
    pub tier: Tier,
    pub error: AdjudicatorError,
    pub calls: u32,
    pub latency_ms: u64,
}

/// Result of asking one tier about one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdjudicationOutcome {
    Success(AdjudicationResult),
    Failure(AdjudicationFailure),
}

impl AdjudicationOutcome {
    pub fn calls(&self) -> u32 {
        match self {
            AdjudicationOutcome::Success(r) => r.calls,
            AdjudicationOutcome::Failure(f) => f.calls,
        }
    }
}

/// An outcome plus the per-attempt trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjudicationReport {
    pub outcome: AdjudicationOutcome,
    pub attempts: Vec<CallAttempt>,
}
