//! Tiered escalation of ambiguous pairs.
//!
//! The [`TierEscalator`] first triages a ranked query synchronously: no
//! candidates, or a best composite outside the ambiguous band, is decided on
//! the spot. Ambiguous pairs become a [`PendingEscalation`] that is resolved
//! asynchronously against the reasoning adjudicator (tier 2) and, when tier 2
//! is unsure or fails, the evidence adjudicator (tier 3).
//!
//! Failure handling:
//!
//! - tier 2 fails → tier 3, if configured and within budget
//! - tier 2 budget exhausted before any call → composite-score verdict,
//!   flagged `budget_exhausted` and `unadjudicated`; tier 3 is not consulted
//! - tier 2 fails and its retry runs out of budget → tier 3, flagged
//!   `adjudicator_failed` and `budget_exhausted`
//! - tier 3 fails → the most recent available decision: a low-confidence
//!   tier-2 verdict if there is one, otherwise the composite score

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use adjudicator::{
    AdjudicationOutcome, AdjudicationReport, AdjudicationRequest, AdjudicationResult, Adjudicator,
    AdjudicatorClient, AdjudicatorError, PairId, Tier,
};
use matcher::MatchCandidate;
use normalize::{NormalizedName, RawName};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::audit::{AuditBuffer, AuditEntry};
use crate::config::EscalationConfig;
use crate::decision::{
    DecisionFlags, DecisionState, MatchDecision, Trail, composite_confidence,
};

/// Where a composite score falls relative to the conclusive thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    ConclusiveMatch,
    ConclusiveNonMatch,
    Ambiguous,
}

/// A query ranked by the match engine, ready for triage.
#[derive(Debug, Clone)]
pub struct RankedQuery {
    pub query_index: usize,
    pub query_id: String,
    pub raw: RawName,
    pub query: NormalizedName,
    /// Top-K candidates, best first.
    pub candidates: Vec<MatchCandidate>,
    /// Raw text of the best candidate, sent to adjudicators.
    pub best_raw: Option<RawName>,
}

/// An ambiguous pair waiting for an adjudicator.
#[derive(Debug, Clone)]
pub struct PendingEscalation {
    ranked: RankedQuery,
    best: MatchCandidate,
}

impl PendingEscalation {
    pub fn query_index(&self) -> usize {
        self.ranked.query_index
    }

    pub fn pair_id(&self) -> PairId {
        PairId::new(&self.ranked.query_id, &self.best.candidate_id)
    }

    pub fn composite(&self) -> f64 {
        self.best.composite
    }

    fn request(&self) -> AdjudicationRequest {
        let candidate = self.ranked.best_raw.as_ref();
        AdjudicationRequest {
            pair_id: self.pair_id(),
            name_a: self.ranked.raw.text.clone(),
            name_b: candidate.map_or_else(|| self.best.candidate.text().to_string(), |r| r.text.clone()),
            context: self
                .ranked
                .raw
                .context
                .clone()
                .or_else(|| candidate.and_then(|r| r.context.clone())),
            composite: self.best.composite,
        }
    }
}

#[derive(Debug)]
pub enum Triage {
    Decided(MatchDecision),
    Ambiguous(PendingEscalation),
}

/// Outcome of the tier protocol for one pair, independent of which query
/// position asked for it.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    trail: Trail,
    flags: DecisionFlags,
    result: Option<AdjudicationResult>,
}

impl Resolution {
    fn resolved(trail: Trail, flags: DecisionFlags, result: AdjudicationResult) -> Self {
        Self {
            trail,
            flags,
            result: Some(result),
        }
    }

    fn unadjudicated(trail: Trail, flags: DecisionFlags) -> Self {
        Self {
            trail,
            flags,
            result: None,
        }
    }
}

/// Pairs currently being adjudicated. The first escalation of a pair claims
/// it and publishes its outcome; concurrent escalations of the same pair wait
/// for that outcome instead of calling an adjudicator again.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    pairs: Mutex<HashMap<PairId, watch::Receiver<Option<Resolution>>>>,
}

pub(crate) enum Claim {
    Leader(InFlightGuard),
    Follower(watch::Receiver<Option<Resolution>>),
}

impl InFlightRegistry {
    pub(crate) fn claim(self: &Arc<Self>, pair: &PairId) -> Claim {
        let mut pairs = self.pairs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(outcome) = pairs.get(pair) {
            return Claim::Follower(outcome.clone());
        }
        let (publish, outcome) = watch::channel(None);
        pairs.insert(pair.clone(), outcome);
        Claim::Leader(InFlightGuard {
            registry: Arc::clone(self),
            pair: pair.clone(),
            publish,
        })
    }

    pub fn is_in_flight(&self, pair: &PairId) -> bool {
        self.pairs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(pair)
    }

    pub fn len(&self) -> usize {
        self.pairs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held by the escalation that owns a pair; releases the pair on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    pair: PairId,
    publish: watch::Sender<Option<Resolution>>,
}

impl InFlightGuard {
    fn publish(&self, resolution: &Resolution) {
        self.publish.send_replace(Some(resolution.clone()));
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .pairs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.pair);
    }
}

/// Decides every query, escalating ambiguous pairs within per-tier budgets.
///
/// Holds no per-pair state beyond the in-flight registry, so one escalator is
/// shared by all chunks of a job.
#[derive(Debug)]
pub struct TierEscalator {
    config: EscalationConfig,
    tier2: Option<AdjudicatorClient>,
    tier3: Option<AdjudicatorClient>,
    registry: Arc<InFlightRegistry>,
    tier2_exhausted_logged: AtomicBool,
    tier3_exhausted_logged: AtomicBool,
}

impl TierEscalator {
    pub fn new(config: EscalationConfig) -> Self {
        Self {
            config,
            tier2: None,
            tier3: None,
            registry: Arc::new(InFlightRegistry::default()),
            tier2_exhausted_logged: AtomicBool::new(false),
            tier3_exhausted_logged: AtomicBool::new(false),
        }
    }

    pub fn with_tier2(mut self, adjudicator: Arc<dyn Adjudicator>) -> Self {
        let cfg = self.config.tier2.clone();
        self.tier2 = Some(AdjudicatorClient::new(Tier::Reasoning, adjudicator, cfg));
        self
    }

    pub fn with_tier3(mut self, adjudicator: Arc<dyn Adjudicator>) -> Self {
        let cfg = self.config.tier3.clone();
        self.tier3 = Some(AdjudicatorClient::new(Tier::Evidence, adjudicator, cfg));
        self
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InFlightRegistry> {
        &self.registry
    }

    pub fn client(&self, tier: Tier) -> Option<&AdjudicatorClient> {
        match tier {
            Tier::Deterministic => None,
            Tier::Reasoning => self.tier2.as_ref(),
            Tier::Evidence => self.tier3.as_ref(),
        }
    }

    /// Calls charged to `tier` so far.
    pub fn calls(&self, tier: Tier) -> u32 {
        self.client(tier).map_or(0, |c| c.budget().used())
    }

    pub fn band(&self, composite: f64) -> Band {
        if composite >= self.config.conclusive_high {
            Band::ConclusiveMatch
        } else if composite < self.config.conclusive_low {
            Band::ConclusiveNonMatch
        } else {
            Band::Ambiguous
        }
    }

    /// Decide conclusive queries immediately; hand back ambiguous ones.
    pub fn triage(&self, ranked: RankedQuery) -> Triage {
        let Some(best) = ranked.candidates.first().cloned() else {
            let flags = DecisionFlags {
                no_candidates: true,
                ..DecisionFlags::default()
            };
            return Triage::Decided(self.conclusive(ranked, false, 100, flags));
        };

        match self.band(best.composite) {
            Band::ConclusiveMatch => {
                let confidence = composite_confidence(best.composite, true);
                Triage::Decided(self.conclusive(ranked, true, confidence, DecisionFlags::default()))
            }
            Band::ConclusiveNonMatch => {
                let confidence = composite_confidence(best.composite, false);
                Triage::Decided(self.conclusive(ranked, false, confidence, DecisionFlags::default()))
            }
            Band::Ambiguous => Triage::Ambiguous(PendingEscalation { ranked, best }),
        }
    }

    /// Run the tier 2 / tier 3 protocol for one ambiguous pair. Every
    /// adjudicator call is recorded into `audit`.
    ///
    /// A pair already being escalated by another task is not adjudicated
    /// again: this call waits for that outcome and decides with it, so both
    /// queries get the same verdict and only the first records the calls.
    pub async fn escalate(&self, pending: PendingEscalation, audit: &mut AuditBuffer) -> MatchDecision {
        let pair_id = pending.pair_id();
        let resolution = match self.registry.claim(&pair_id) {
            Claim::Leader(guard) => {
                let resolution = self.adjudicate(&pending, audit).await;
                guard.publish(&resolution);
                resolution
            }
            Claim::Follower(mut outcome) => {
                debug!(pair = %pair_id, "pair_already_in_flight");
                let shared = outcome
                    .wait_for(Option::is_some)
                    .await
                    .ok()
                    .and_then(|published| (*published).clone());
                match shared {
                    Some(resolution) => resolution,
                    // The owning escalation was dropped before finishing.
                    None => self.adjudicate(&pending, audit).await,
                }
            }
        };

        let Resolution {
            trail,
            flags,
            result,
        } = resolution;
        match result {
            Some(result) => self.resolved(pending, trail, flags, result),
            None => self.unadjudicated(pending, trail, flags),
        }
    }

    async fn adjudicate(&self, pending: &PendingEscalation, audit: &mut AuditBuffer) -> Resolution {
        let mut trail = Trail::new();
        let mut flags = DecisionFlags::default();
        let pair_id = pending.pair_id();
        let request = pending.request();
        let mut fallback: Option<AdjudicationResult> = None;

        match self.tier2.as_ref() {
            None => flags.no_adjudicator = true,
            Some(client) if client.budget().is_exhausted() => {
                self.note_exhausted(client);
                flags.budget_exhausted = true;
                return Resolution::unadjudicated(trail, flags);
            }
            Some(client) => {
                trail.push(DecisionState::EscalatedTier2);
                debug!(pair = %pair_id, composite = pending.composite(), "pair_escalated_tier2");
                let report = client.adjudicate(&request).await;
                record_calls(audit, pending.query_index(), &report);
                match report.outcome {
                    AdjudicationOutcome::Success(result)
                        if result.confidence >= self.config.tier2_min_confidence =>
                    {
                        return Resolution::resolved(trail, flags, result);
                    }
                    AdjudicationOutcome::Success(result) => {
                        flags.low_confidence = true;
                        fallback = Some(result);
                    }
                    AdjudicationOutcome::Failure(failure)
                        if failure.error == AdjudicatorError::BudgetExhausted =>
                    {
                        self.note_exhausted(client);
                        flags.budget_exhausted = true;
                        // Out of budget before asking anything: no verdict to
                        // improve on. Failed attempts that then ran out of
                        // budget still go to tier 3.
                        if failure.calls == 0 {
                            return Resolution::unadjudicated(trail, flags);
                        }
                        flags.adjudicator_failed = true;
                    }
                    AdjudicationOutcome::Failure(_) => flags.adjudicator_failed = true,
                }
            }
        }

        match self.tier3.as_ref() {
            None => flags.no_adjudicator = true,
            Some(client) if client.budget().is_exhausted() => {
                self.note_exhausted(client);
                flags.budget_exhausted = true;
            }
            Some(client) => {
                trail.push(DecisionState::EscalatedTier3);
                debug!(pair = %pair_id, composite = pending.composite(), "pair_escalated_tier3");
                let report = client.adjudicate(&request).await;
                record_calls(audit, pending.query_index(), &report);
                match report.outcome {
                    AdjudicationOutcome::Success(result) => {
                        return Resolution::resolved(trail, flags, result);
                    }
                    AdjudicationOutcome::Failure(failure) => {
                        if failure.error == AdjudicatorError::BudgetExhausted {
                            self.note_exhausted(client);
                            flags.budget_exhausted = true;
                        }
                        if failure.calls > 0 {
                            flags.adjudicator_failed = true;
                        }
                    }
                }
            }
        }

        Resolution {
            trail,
            flags,
            result: fallback,
        }
    }

    fn conclusive(
        &self,
        ranked: RankedQuery,
        same_entity: bool,
        confidence: u8,
        flags: DecisionFlags,
    ) -> MatchDecision {
        let (state, path) = Trail::new().finish(DecisionState::Conclusive);
        MatchDecision {
            query_index: ranked.query_index,
            query_id: ranked.query_id,
            query: ranked.query,
            best: ranked.candidates.first().cloned(),
            candidates: ranked.candidates,
            state,
            path,
            tier: Tier::Deterministic,
            same_entity,
            confidence,
            flags,
            adjudication: None,
        }
    }

    fn resolved(
        &self,
        pending: PendingEscalation,
        trail: Trail,
        flags: DecisionFlags,
        result: AdjudicationResult,
    ) -> MatchDecision {
        let (state, path) = trail.finish(DecisionState::Resolved);
        MatchDecision {
            query_index: pending.ranked.query_index,
            query_id: pending.ranked.query_id,
            query: pending.ranked.query,
            best: Some(pending.best),
            candidates: pending.ranked.candidates,
            state,
            path,
            tier: result.tier,
            same_entity: result.same_entity,
            confidence: result.confidence,
            flags,
            adjudication: Some(result),
        }
    }

    fn unadjudicated(
        &self,
        pending: PendingEscalation,
        trail: Trail,
        mut flags: DecisionFlags,
    ) -> MatchDecision {
        flags.unadjudicated = true;
        let composite = pending.best.composite;
        let same_entity = composite >= self.config.unadjudicated_accept;
        let (state, path) = trail.finish(DecisionState::Unadjudicated);
        MatchDecision {
            query_index: pending.ranked.query_index,
            query_id: pending.ranked.query_id,
            query: pending.ranked.query,
            best: Some(pending.best),
            candidates: pending.ranked.candidates,
            state,
            path,
            tier: Tier::Deterministic,
            same_entity,
            confidence: composite_confidence(composite, same_entity),
            flags,
            adjudication: None,
        }
    }

    fn note_exhausted(&self, client: &AdjudicatorClient) {
        let logged = match client.tier() {
            Tier::Reasoning => &self.tier2_exhausted_logged,
            _ => &self.tier3_exhausted_logged,
        };
        if !logged.swap(true, Ordering::AcqRel) {
            info!(
                tier = %client.tier(),
                limit = client.budget().limit(),
                "adjudication_budget_exhausted"
            );
        }
    }
}

fn record_calls(audit: &mut AuditBuffer, query_index: usize, report: &AdjudicationReport) {
    let (pair_id, tier, verdict) = match &report.outcome {
        AdjudicationOutcome::Success(r) => (&r.pair_id, r.tier, Some((r.confidence, r.same_entity))),
        AdjudicationOutcome::Failure(f) => (&f.pair_id, f.tier, None),
    };
    for call in &report.attempts {
        let answered = if call.error.is_none() { verdict } else { None };
        audit.push(AuditEntry::AdjudicationCall {
            query_index,
            pair_id: pair_id.clone(),
            tier,
            attempt: call.attempt,
            latency_ms: call.latency_ms,
            error: call.error.clone(),
            confidence: answered.map(|(c, _)| c),
            same_entity: answered.map(|(_, s)| s),
        });
    }
}
