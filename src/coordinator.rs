//! Job orchestration across a CPU pool and a bounded I/O pool.
//!
//! Queries are split into fixed-size chunks. Each chunk is normalized, scored
//! and triaged on a dedicated rayon pool; ambiguous pairs are then escalated
//! on tokio, with at most `io_concurrency` adjudications in flight across the
//! whole job. Chunks may finish in any order; decisions are merged back into
//! input order.
//!
//! A chunk's decisions and audit records are committed together, after the
//! chunk has fully finished. Cancellation stops dispatch of new chunks. A chunk
//! that finished before the cancel is committed even if it is joined later;
//! one still running when the cancel lands is awaited and discarded.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use adjudicator::{Adjudicator, Tier};
use blocking::{BlockingIndex, Candidate};
use matcher::MatchEngine;
use normalize::RawName;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::audit::{AuditBuffer, AuditEntry, AuditSink};
use crate::config::PreparedJob;
use crate::decision::{DecisionState, MatchDecision};
use crate::error::JobError;
use crate::escalation::{RankedQuery, TierEscalator, Triage};

/// One input name with its caller-supplied id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl NameRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context: None,
            source: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn to_raw(&self) -> RawName {
        RawName {
            text: self.name.clone(),
            context: self.context.clone(),
            source_id: self.source.clone(),
        }
    }
}

/// Shared cancellation switch for a running job.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Progress after a chunk is committed.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkProgress {
    pub chunk: usize,
    pub chunk_len: usize,
    /// Queries committed so far.
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// Linear estimate from the rate so far; `None` until something is done.
    pub eta: Option<Duration>,
}

pub trait ProgressObserver: Send + Sync {
    fn on_chunk(&self, progress: &ChunkProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ChunkProgress) + Send + Sync,
{
    fn on_chunk(&self, progress: &ChunkProgress) {
        self(progress)
    }
}

/// Adjudicators available to a job. Either tier may be absent.
#[derive(Clone, Default)]
pub struct Adjudicators {
    pub tier2: Option<Arc<dyn Adjudicator>>,
    pub tier3: Option<Arc<dyn Adjudicator>>,
}

impl Adjudicators {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_tier2(mut self, adjudicator: Arc<dyn Adjudicator>) -> Self {
        self.tier2 = Some(adjudicator);
        self
    }

    pub fn with_tier3(mut self, adjudicator: Arc<dyn Adjudicator>) -> Self {
        self.tier3 = Some(adjudicator);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    /// Pairs actually scored (committed chunks only).
    pub pairs_scored: u64,
    /// `queries × candidates` for the committed queries.
    pub naive_comparisons: u64,
    pub reduction_ratio: f64,
    pub conclusive: usize,
    pub escalated: usize,
    pub resolved: usize,
    pub unadjudicated: usize,
    pub budget_exhausted: usize,
    /// Calls made, including those of discarded chunks.
    pub tier2_calls: u32,
    pub tier3_calls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    /// Committed decisions in input order.
    pub decisions: Vec<MatchDecision>,
    pub cancelled: bool,
    pub chunks_completed: usize,
    pub chunks_total: usize,
    pub stats: JobStats,
}

/// Runs one resolution job. Budgets live in the escalator, so a coordinator
/// is consumed by [`ParallelCoordinator::run`].
pub struct ParallelCoordinator {
    job: Arc<PreparedJob>,
    escalator: Arc<TierEscalator>,
    cpu_pool: Arc<rayon::ThreadPool>,
    io_limit: Arc<Semaphore>,
    audit: Option<Arc<dyn AuditSink>>,
    progress: Option<Arc<dyn ProgressObserver>>,
    cancel: CancelFlag,
    job_id: String,
}

impl ParallelCoordinator {
    pub fn new(job: PreparedJob, adjudicators: Adjudicators) -> Result<Self, JobError> {
        let workers = *job.workers();
        let cpu_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.cpu_threads())
            .thread_name(|i| format!("nameres-cpu-{i}"))
            .panic_handler(|_| error!("cpu_worker_panicked"))
            .build()
            .map_err(|e| JobError::WorkerPool(format!("failed to build CPU pool: {e}")))?;

        let mut escalator = TierEscalator::new(job.escalation().clone());
        if let Some(tier2) = adjudicators.tier2 {
            escalator = escalator.with_tier2(tier2);
        }
        if let Some(tier3) = adjudicators.tier3 {
            escalator = escalator.with_tier3(tier3);
        }

        Ok(Self {
            io_limit: Arc::new(Semaphore::new(workers.io_concurrency)),
            cpu_pool: Arc::new(cpu_pool),
            escalator: Arc::new(escalator),
            job: Arc::new(job),
            audit: None,
            progress: None,
            cancel: CancelFlag::new(),
            job_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(observer);
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    /// Share an existing cancellation flag, e.g. one already wired to a
    /// signal handler or an adjudicator.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn escalator(&self) -> &Arc<TierEscalator> {
        &self.escalator
    }

    /// Resolve every query against the candidate set.
    pub async fn run(
        self,
        queries: Vec<NameRecord>,
        candidates: Vec<NameRecord>,
    ) -> Result<JobReport, JobError> {
        let span = info_span!("job", job_id = %self.job_id);
        self.run_job(queries, candidates).instrument(span).await
    }

    async fn run_job(
        self,
        queries: Vec<NameRecord>,
        candidates: Vec<NameRecord>,
    ) -> Result<JobReport, JobError> {
        let started = Instant::now();
        let total = queries.len();
        let workers = *self.job.workers();

        let normalizer = Arc::clone(self.job.normalizer());
        let candidates = on_pool(&self.cpu_pool, move || {
            candidates
                .into_par_iter()
                .map(|record| {
                    let raw = record.to_raw();
                    let name = normalizer.normalize_raw(&raw);
                    Candidate {
                        id: record.id,
                        raw,
                        name,
                    }
                })
                .collect::<Vec<_>>()
        })
        .await?;

        let index = Arc::new(BlockingIndex::build(
            candidates,
            &self.job.config().blocking,
        )?);
        let engine = Arc::new(MatchEngine::new(
            Arc::clone(self.job.normalizer()),
            Arc::clone(&index),
            self.job.weights(),
        )?);

        let mut queue: VecDeque<PendingChunk> = VecDeque::new();
        let mut records = queries.into_iter();
        let mut offset = 0;
        loop {
            let chunk: Vec<NameRecord> = records.by_ref().take(workers.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let len = chunk.len();
            queue.push_back(PendingChunk {
                index: queue.len(),
                offset,
                records: chunk,
            });
            offset += len;
        }
        let chunks_total = queue.len();
        let max_in_flight = self.cpu_pool.current_num_threads().max(1);

        info!(
            queries = total,
            candidates = index.len(),
            chunks = chunks_total,
            cpu_threads = self.cpu_pool.current_num_threads(),
            io_concurrency = workers.io_concurrency,
            "job_started"
        );

        let context = ChunkContext {
            job_id: Arc::from(self.job_id.as_str()),
            engine: Arc::clone(&engine),
            escalator: Arc::clone(&self.escalator),
            cpu_pool: Arc::clone(&self.cpu_pool),
            io_limit: Arc::clone(&self.io_limit),
            top_k: self.job.config().matching.top_k,
            record_all_pairs: self.job.config().audit.record_all_pairs,
            cancel: self.cancel.clone(),
        };

        let mut running = JoinSet::new();
        let mut committed: BTreeMap<usize, Vec<MatchDecision>> = BTreeMap::new();
        let mut processed = 0usize;
        let mut pairs_scored = 0u64;

        loop {
            while running.len() < max_in_flight && !self.cancel.is_cancelled() {
                let Some(chunk) = queue.pop_front() else {
                    break;
                };
                let span = info_span!("chunk", chunk = chunk.index);
                running.spawn(context.clone().run(chunk).instrument(span));
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let output = joined
                .map_err(|e| JobError::WorkerPool(format!("chunk task failed: {e}")))??;

            if output.finished_after_cancel {
                debug!(chunk = output.index, "chunk_discarded");
                continue;
            }

            if let Some(sink) = &self.audit {
                sink.append_all(output.audit.records())?;
            }
            processed += output.decisions.len();
            pairs_scored += output.pairs_scored;

            let elapsed = started.elapsed();
            let eta = (processed > 0).then(|| {
                elapsed.mul_f64((total - processed) as f64 / processed as f64)
            });
            let progress = ChunkProgress {
                chunk: output.index,
                chunk_len: output.decisions.len(),
                processed,
                total,
                elapsed,
                eta,
            };
            info!(
                chunk = progress.chunk,
                processed,
                total,
                elapsed_ms = elapsed.as_millis() as u64,
                eta_ms = eta.map(|d| d.as_millis() as u64),
                "chunk_progress"
            );
            if let Some(observer) = &self.progress {
                observer.on_chunk(&progress);
            }
            committed.insert(output.index, output.decisions);
        }

        if let Some(sink) = &self.audit {
            sink.flush()?;
        }

        let cancelled = self.cancel.is_cancelled();
        let chunks_completed = committed.len();
        let decisions: Vec<MatchDecision> = committed.into_values().flatten().collect();

        let reduction = index.reduction_report(decisions.iter().map(|d| &d.query));
        let mut stats = JobStats {
            pairs_scored,
            naive_comparisons: reduction.naive,
            reduction_ratio: reduction.ratio,
            tier2_calls: self.escalator.calls(Tier::Reasoning),
            tier3_calls: self.escalator.calls(Tier::Evidence),
            ..JobStats::default()
        };
        for d in &decisions {
            match d.state {
                DecisionState::Conclusive => stats.conclusive += 1,
                DecisionState::Resolved => stats.resolved += 1,
                DecisionState::Unadjudicated => stats.unadjudicated += 1,
                _ => {}
            }
            if d.was_escalated() {
                stats.escalated += 1;
            }
            if d.flags.budget_exhausted {
                stats.budget_exhausted += 1;
            }
        }

        if cancelled {
            info!(
                chunks_completed,
                chunks_total,
                processed,
                "job_cancelled"
            );
        }
        info!(
            decisions = decisions.len(),
            conclusive = stats.conclusive,
            escalated = stats.escalated,
            unadjudicated = stats.unadjudicated,
            tier2_calls = stats.tier2_calls,
            tier3_calls = stats.tier3_calls,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "job_finished"
        );

        Ok(JobReport {
            job_id: self.job_id,
            decisions,
            cancelled,
            chunks_completed,
            chunks_total,
            stats,
        })
    }
}

struct PendingChunk {
    index: usize,
    offset: usize,
    records: Vec<NameRecord>,
}

struct ChunkOutput {
    index: usize,
    decisions: Vec<MatchDecision>,
    audit: AuditBuffer,
    pairs_scored: u64,
    finished_after_cancel: bool,
}

/// Read-only handles a chunk task needs. Cloning copies `Arc`s only.
#[derive(Clone)]
struct ChunkContext {
    job_id: Arc<str>,
    engine: Arc<MatchEngine>,
    escalator: Arc<TierEscalator>,
    cpu_pool: Arc<rayon::ThreadPool>,
    io_limit: Arc<Semaphore>,
    top_k: usize,
    record_all_pairs: bool,
    cancel: CancelFlag,
}

impl ChunkContext {
    async fn run(self, chunk: PendingChunk) -> Result<ChunkOutput, JobError> {
        let started = Instant::now();
        let PendingChunk {
            index,
            offset,
            records,
        } = chunk;
        let len = records.len();

        let scoring = {
            let ctx = self.clone();
            on_pool(&self.cpu_pool, move || ctx.score_chunk(offset, records))
        };
        let scored = scoring.await?;

        let mut pairs_scored = 0u64;
        let mut slots: Vec<Option<MatchDecision>> = vec![None; len];
        let mut per_query: Vec<AuditBuffer> = Vec::with_capacity(len);
        let mut escalations = JoinSet::new();

        for (slot, item) in scored.into_iter().enumerate() {
            pairs_scored += item.pairs_scored;
            per_query.push(item.audit);
            match item.triage {
                Triage::Decided(decision) => slots[slot] = Some(decision),
                Triage::Ambiguous(pending) => {
                    let escalator = Arc::clone(&self.escalator);
                    let io_limit = Arc::clone(&self.io_limit);
                    let job_id = Arc::clone(&self.job_id);
                    escalations.spawn(async move {
                        let _permit = io_limit.acquire_owned().await.map_err(|_| {
                            JobError::WorkerPool("adjudication limiter closed".to_string())
                        })?;
                        let mut calls = AuditBuffer::new(job_id);
                        let decision = escalator.escalate(pending, &mut calls).await;
                        Ok::<_, JobError>((slot, decision, calls))
                    });
                }
            }
        }

        while let Some(joined) = escalations.join_next().await {
            let (slot, decision, calls) = joined
                .map_err(|e| JobError::WorkerPool(format!("escalation task failed: {e}")))??;
            if let Some(buffer) = per_query.get_mut(slot) {
                buffer.append(calls);
            }
            if let Some(entry) = slots.get_mut(slot) {
                *entry = Some(decision);
            }
        }

        let mut audit = AuditBuffer::new(Arc::clone(&self.job_id));
        let mut decisions = Vec::with_capacity(len);
        for (buffer, decision) in per_query.into_iter().zip(slots) {
            let decision = decision.ok_or_else(|| {
                JobError::WorkerPool(format!("chunk {index} is missing a decision"))
            })?;
            audit.append(buffer);
            audit.push(AuditEntry::decision(&decision));
            decisions.push(decision);
        }

        debug!(
            chunk = index,
            queries = len,
            pairs_scored,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chunk_finished"
        );

        Ok(ChunkOutput {
            index,
            decisions,
            audit,
            pairs_scored,
            finished_after_cancel: self.cancel.is_cancelled(),
        })
    }

    /// CPU half of a chunk: normalize, score and triage every query.
    fn score_chunk(&self, offset: usize, records: Vec<NameRecord>) -> Vec<ScoredItem> {
        records
            .into_par_iter()
            .enumerate()
            .map(|(i, record)| self.score_one(offset + i, record))
            .collect()
    }

    fn score_one(&self, query_index: usize, record: NameRecord) -> ScoredItem {
        let raw = record.to_raw();
        let scored = self.engine.score_query(&raw);
        let pairs_scored = scored.candidates.len() as u64;

        let mut audit = AuditBuffer::new(Arc::clone(&self.job_id));
        let recorded = if self.record_all_pairs {
            &scored.candidates[..]
        } else {
            scored.top(self.top_k)
        };
        for c in recorded {
            audit.push(AuditEntry::PairScored {
                query_index,
                query_id: record.id.clone(),
                candidate_id: c.candidate_id.clone(),
                candidate_index: c.candidate_index,
                query: c.query.text().to_string(),
                candidate: c.candidate.text().to_string(),
                block_key: scored.block_key.to_string(),
                rank: c.rank,
                vector: c.vector,
                composite: c.composite,
            });
        }

        let best_raw = scored
            .best()
            .and_then(|c| self.engine.index().candidate(c.candidate_index))
            .map(|c| c.raw.clone());
        let query = scored.query.clone();
        let ranked = RankedQuery {
            query_index,
            query_id: record.id,
            raw,
            query,
            candidates: scored.into_top(self.top_k),
            best_raw,
        };

        ScoredItem {
            triage: self.escalator.triage(ranked),
            audit,
            pairs_scored,
        }
    }
}

struct ScoredItem {
    triage: Triage,
    audit: AuditBuffer,
    pairs_scored: u64,
}

/// Run `f` on the CPU pool without blocking the async runtime.
async fn on_pool<T, F>(pool: &rayon::ThreadPool, f: F) -> Result<T, JobError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    pool.spawn(move || {
        let _ = tx.send(f());
    });
    rx.await
        .map_err(|_| JobError::WorkerPool("CPU worker exited without a result".to_string()))
}
