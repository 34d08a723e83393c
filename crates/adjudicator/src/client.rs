use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::budget::CallBudget;
use crate::config::AdjudicatorConfig;
use crate::contract::Adjudicator;
use crate::error::AdjudicatorError;
use crate::resilience::{CircuitBreaker, CircuitState, TokenBucket};
use crate::schema::validate_response;
use crate::types::{
    AdjudicationFailure, AdjudicationOutcome, AdjudicationReport, AdjudicationRequest,
    AdjudicationResult, CallAttempt, Tier, Verdict,
};

/// Wraps one tier's [`Adjudicator`] with its budget and resilience policies.
///
/// Each attempt passes, in order: the rate limiter, the circuit breaker, a
/// budget reservation, and a hard timeout. Responses are schema-validated;
/// a malformed body is a failed attempt, never a verdict.
pub struct AdjudicatorClient {
    tier: Tier,
    adjudicator: Arc<dyn Adjudicator>,
    config: AdjudicatorConfig,
    budget: CallBudget,
    breaker: CircuitBreaker,
    limiter: TokenBucket,
}

impl std::fmt::Debug for AdjudicatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdjudicatorClient")
            .field("tier", &self.tier)
            .field("adjudicator", &self.adjudicator.name())
            .field("budget", &self.budget)
            .field("breaker", &self.breaker.current_state())
            .finish()
    }
}

impl AdjudicatorClient {
    pub fn new(tier: Tier, adjudicator: Arc<dyn Adjudicator>, config: AdjudicatorConfig) -> Self {
        let breaker_name = format!("{tier}/{}", adjudicator.name());
        Self {
            tier,
            budget: CallBudget::new(config.max_calls),
            breaker: CircuitBreaker::new(breaker_name, config.circuit_breaker),
            limiter: TokenBucket::new(config.rate_limit),
            adjudicator,
            config,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }

    pub fn breaker_state(&self) -> CircuitState {
        self.breaker.current_state()
    }

    /// Adjudicate one pair, retrying transient failures within budget.
    pub async fn adjudicate(&self, request: &AdjudicationRequest) -> AdjudicationReport {
        let start = Instant::now();
        let mut attempts: Vec<CallAttempt> = Vec::new();
        let mut calls = 0u32;
        let max_attempts = self.config.retry.max_attempts();
        let mut round = 0u32;

        let error = loop {
            let result = self.attempt(request, &mut calls, &mut attempts).await;
            let err = match result {
                Ok(verdict) => {
                    let result = AdjudicationResult {
                        pair_id: request.pair_id.clone(),
                        tier: self.tier,
                        confidence: verdict.confidence,
                        same_entity: verdict.same_entity,
                        rationale: verdict.rationale,
                        evidence: verdict.evidence,
                        calls,
                        latency_ms: elapsed_ms(start),
                    };
                    debug!(
                        tier = %self.tier,
                        pair = %request.pair_id,
                        confidence = result.confidence,
                        same_entity = result.same_entity,
                        calls,
                        "adjudication_success"
                    );
                    return AdjudicationReport {
                        outcome: AdjudicationOutcome::Success(result),
                        attempts,
                    };
                }
                Err(err) => err,
            };

            round += 1;
            if !err.is_retryable() || round >= max_attempts {
                break err;
            }
            tokio::time::sleep(self.config.retry.backoff_delay(round - 1)).await;
        };

        AdjudicationReport {
            outcome: AdjudicationOutcome::Failure(AdjudicationFailure {
                pair_id: request.pair_id.clone(),
                tier: self.tier,
                error,
                calls,
                latency_ms: elapsed_ms(start),
            }),
            attempts,
        }
    }

    async fn attempt(
        &self,
        request: &AdjudicationRequest,
        calls: &mut u32,
        attempts: &mut Vec<CallAttempt>,
    ) -> Result<Verdict, AdjudicatorError> {
        if !self.limiter.acquire().await {
            return Err(AdjudicatorError::rate_limited("local token bucket wait exceeded"));
        }
        if !self.breaker.allow_request() {
            return Err(AdjudicatorError::CircuitOpen);
        }
        if !self.budget.try_reserve() {
            self.breaker.release_probe();
            return Err(AdjudicatorError::BudgetExhausted);
        }

        *calls += 1;
        let call_start = Instant::now();
        let timeout = self.config.call_timeout;
        let result =
            match tokio::time::timeout(timeout, self.adjudicator.adjudicate(request)).await {
                Ok(Ok(raw)) => validate_response(&raw),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(AdjudicatorError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }),
            };
        let latency_ms = elapsed_ms(call_start);

        match result {
            Ok(verdict) => {
                self.breaker.record_success();
                attempts.push(CallAttempt {
                    attempt: *calls,
                    latency_ms,
                    error: None,
                });
                Ok(verdict)
            }
            Err(err) => {
                self.breaker.record_failure();
                warn!(
                    tier = %self.tier,
                    pair = %request.pair_id,
                    attempt = *calls,
                    error_class = err.class(),
                    error = %err,
                    snippet = err.snippet().unwrap_or(""),
                    latency_ms,
                    "adjudicator_failure"
                );
                attempts.push(CallAttempt {
                    attempt: *calls,
                    latency_ms,
                    error: Some(err.clone()),
                });
                Err(err)
            }
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
