use adjudicator::{AdjudicationResult, Tier};
use matcher::MatchCandidate;
use normalize::NormalizedName;
use serde::{Deserialize, Serialize};

/// Escalation state of one query's best pair.
///
/// ```text
/// Scored ─┬─> Conclusive
///         ├─> EscalatedTier2 ─┬─> Resolved
///         │                   ├─> EscalatedTier3 ─┬─> Resolved
///         │                   │                   └─> Unadjudicated
///         │                   └─> Unadjudicated
///         ├─> EscalatedTier3 (no tier-2 adjudicator)
///         └─> Unadjudicated
/// ```
///
/// `Resolved` always carries an [`AdjudicationResult`]; `Unadjudicated`
/// decisions fall back to the composite score and say why in their flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    Scored,
    Conclusive,
    EscalatedTier2,
    EscalatedTier3,
    Resolved,
    Unadjudicated,
}

impl DecisionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DecisionState::Conclusive | DecisionState::Resolved | DecisionState::Unadjudicated
        )
    }

    pub fn can_transition_to(self, next: DecisionState) -> bool {
        use DecisionState::*;
        matches!(
            (self, next),
            (
                Scored,
                Conclusive | EscalatedTier2 | EscalatedTier3 | Unadjudicated
            ) | (EscalatedTier2, EscalatedTier3 | Resolved | Unadjudicated)
                | (EscalatedTier3, Resolved | Unadjudicated)
        )
    }
}

/// Why a decision looks the way it does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionFlags {
    /// A tier budget ran out before this pair could be adjudicated.
    pub budget_exhausted: bool,
    /// The verdict comes from the composite score alone.
    pub unadjudicated: bool,
    /// At least one adjudicator call for this pair failed.
    pub adjudicator_failed: bool,
    /// Tier 2 answered below the confidence floor.
    pub low_confidence: bool,
    /// The query had nothing to compare against.
    pub no_candidates: bool,
    /// A tier the pair needed has no adjudicator configured.
    pub no_adjudicator: bool,
}

/// Terminal output for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    /// Position of the query in the job input.
    pub query_index: usize,
    pub query_id: String,
    pub query: NormalizedName,
    /// Highest-ranked candidate, if any.
    pub best: Option<MatchCandidate>,
    /// Top-K candidates, best first (includes `best`).
    pub candidates: Vec<MatchCandidate>,
    /// Terminal state; always the last entry of `path`.
    pub state: DecisionState,
    pub path: Vec<DecisionState>,
    pub tier: Tier,
    pub same_entity: bool,
    /// Confidence in `same_entity`, 0–100.
    pub confidence: u8,
    pub flags: DecisionFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjudication: Option<AdjudicationResult>,
}

impl MatchDecision {
    pub fn best_candidate_id(&self) -> Option<&str> {
        self.best.as_ref().map(|c| c.candidate_id.as_str())
    }

    /// Composite score of the best pair; 0 when there is none.
    pub fn composite(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |c| c.composite)
    }

    pub fn was_escalated(&self) -> bool {
        self.path.iter().any(|s| {
            matches!(
                s,
                DecisionState::EscalatedTier2 | DecisionState::EscalatedTier3
            )
        })
    }

    /// Id of the accepted match: the best candidate when the verdict is
    /// positive.
    pub fn matched_id(&self) -> Option<&str> {
        if self.same_entity {
            self.best_candidate_id()
        } else {
            None
        }
    }
}

/// Confidence of a verdict reached from the composite score alone: the
/// composite for a positive verdict, its complement for a negative one.
pub fn composite_confidence(composite: f64, same_entity: bool) -> u8 {
    let c = composite.clamp(0.0, 100.0);
    let value = if same_entity { c } else { 100.0 - c };
    value.round() as u8
}

/// Records a decision's state path, rejecting illegal transitions.
#[derive(Debug, Clone)]
pub(crate) struct Trail {
    path: Vec<DecisionState>,
}

impl Trail {
    pub(crate) fn new() -> Self {
        Self {
            path: vec![DecisionState::Scored],
        }
    }

    pub(crate) fn current(&self) -> DecisionState {
        self.path
            .last()
            .copied()
            .unwrap_or(DecisionState::Scored)
    }

    pub(crate) fn push(&mut self, next: DecisionState) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.current()
        );
        self.path.push(next);
    }

    pub(crate) fn finish(mut self, terminal: DecisionState) -> (DecisionState, Vec<DecisionState>) {
        self.push(terminal);
        (terminal, self.path)
    }
}
