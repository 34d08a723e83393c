//! External adjudication of ambiguous name pairs.
//!
//! An [`Adjudicator`] is a black box (a reasoning service, an
//! evidence-gathering service) that answers "are these the same entity?".
//! [`AdjudicatorClient`] wraps one per tier and owns everything that makes
//! calling it safe at scale:
//!
//! - a [`CallBudget`] that caps calls per job, exact under concurrency
//! - a token-bucket rate limiter and a circuit breaker
//! - a hard per-attempt timeout
//! - exponential backoff with jitter between attempts
//! - schema validation of every response ([`validate_response`])
//!
//! The result is an [`AdjudicationOutcome`]: either a validated
//! [`AdjudicationResult`] or an [`AdjudicationFailure`] carrying an
//! [`AdjudicatorError`]. Failures are values; nothing here panics or aborts
//! the caller's job.

mod budget;
mod client;
mod config;
mod contract;
mod error;
#[cfg(feature = "http")]
mod http;
pub mod resilience;
mod schema;
mod serde_millis;
pub mod testing;
mod types;

pub use crate::budget::CallBudget;
pub use crate::client::AdjudicatorClient;
pub use crate::config::AdjudicatorConfig;
pub use crate::contract::Adjudicator;
pub use crate::error::{snippet, AdjudicatorError, InvalidAdjudicatorConfig, SNIPPET_LIMIT};
#[cfg(feature = "http")]
pub use crate::http::HttpAdjudicator;
pub use crate::schema::validate_response;
pub use crate::types::{
    AdjudicationFailure, AdjudicationOutcome, AdjudicationReport, AdjudicationRequest,
    AdjudicationResult, CallAttempt, Evidence, PairId, Tier, Verdict,
};
