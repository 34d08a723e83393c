//! Workspace umbrella crate for nameres.
//!
//! Stitches the stage crates into one job: names are normalized
//! ([`normalize`]), partitioned into blocks ([`blocking`]), scored and ranked
//! ([`matcher`], [`similarity`]), and ambiguous pairs are escalated to
//! external adjudicators ([`adjudicator`]) by the [`TierEscalator`]. The
//! [`ParallelCoordinator`] runs all of it over a CPU pool and a bounded I/O
//! pool and returns one [`MatchDecision`] per query, in input order, while
//! writing an append-only audit trail.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nameres::{Adjudicators, JobConfig, JsonlAuditLog, NameRecord, ParallelCoordinator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let job = JobConfig::from_file("job.yaml")?.prepare()?;
//! let audit = Arc::new(JsonlAuditLog::open("audit.jsonl")?);
//! let coordinator = ParallelCoordinator::new(job, Adjudicators::none())?
//!     .with_audit_sink(audit);
//!
//! let queries = vec![NameRecord::new("q1", "St. Mary's Hospital")];
//! let candidates = vec![NameRecord::new("npi-1", "Saint Marys Medical Center")];
//! let report = coordinator.run(queries, candidates).await?;
//! for decision in &report.decisions {
//!     println!("{} -> {:?}", decision.query_id, decision.matched_id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod escalation;

pub use crate::audit::{
    AUDIT_SCHEMA_VERSION, AuditBuffer, AuditEntry, AuditError, AuditRecord, AuditSink,
    JsonlAuditLog, MemoryAuditLog,
};
pub use crate::config::{AuditConfig, EscalationConfig, JobConfig, PreparedJob, WorkerConfig};
pub use crate::coordinator::{
    Adjudicators, CancelFlag, ChunkProgress, JobReport, JobStats, NameRecord,
    ParallelCoordinator, ProgressObserver,
};
pub use crate::decision::{DecisionFlags, DecisionState, MatchDecision, composite_confidence};
pub use crate::error::{ConfigError, JobError};
pub use crate::escalation::{
    Band, InFlightRegistry, PendingEscalation, RankedQuery, TierEscalator, Triage,
};

pub use adjudicator::{
    AdjudicationOutcome, AdjudicationRequest, AdjudicationResult, Adjudicator, AdjudicatorClient,
    AdjudicatorConfig, AdjudicatorError, Evidence, PairId, Tier, Verdict,
};
pub use blocking::{BlockKey, BlockingConfig, BlockingIndex, BlockingStrategy, Candidate};
pub use matcher::{MatchCandidate, MatchConfig, MatchEngine, ScoredQuery};
pub use normalize::{NormalizeConfig, NormalizedName, Normalizer, RawName};
pub use similarity::{Metric, SimilarityScorer, SimilarityVector, Weights, composite_score};
