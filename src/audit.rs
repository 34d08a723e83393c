//! Append-only audit log.
//!
//! One record per scored pair, one per adjudicator call and one per final
//! decision. Records are JSON objects tagged by `kind`; every record carries
//! `schema_version`, `job_id` and `recorded_at`. Fields are only ever added
//! to this schema, never renamed or removed.
//!
//! Records for a chunk are buffered while the chunk runs and handed to the
//! [`AuditSink`] only once the chunk is committed, so a cancelled job leaves
//! no partial entries behind.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use adjudicator::{AdjudicatorError, PairId, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use similarity::SimilarityVector;
use thiserror::Error;

use crate::decision::{DecisionFlags, DecisionState, MatchDecision};

pub const AUDIT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit write failed: {0}")]
    Io(#[from] io::Error),

    #[error("audit record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub schema_version: u32,
    pub job_id: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: AuditEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
    PairScored {
        query_index: usize,
        query_id: String,
        candidate_id: String,
        candidate_index: usize,
        query: String,
        candidate: String,
        block_key: String,
        rank: usize,
        vector: SimilarityVector,
        composite: f64,
    },
    AdjudicationCall {
        query_index: usize,
        pair_id: PairId,
        tier: Tier,
        attempt: u32,
        latency_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<AdjudicatorError>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        same_entity: Option<bool>,
    },
    Decision {
        query_index: usize,
        query_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidate_id: Option<String>,
        composite: f64,
        state: DecisionState,
        path: Vec<DecisionState>,
        tier: Tier,
        same_entity: bool,
        confidence: u8,
        flags: DecisionFlags,
    },
}

impl AuditEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEntry::PairScored { .. } => "pair_scored",
            AuditEntry::AdjudicationCall { .. } => "adjudication_call",
            AuditEntry::Decision { .. } => "decision",
        }
    }

    pub fn query_index(&self) -> usize {
        match self {
            AuditEntry::PairScored { query_index, .. }
            | AuditEntry::AdjudicationCall { query_index, .. }
            | AuditEntry::Decision { query_index, .. } => *query_index,
        }
    }

    pub fn decision(decision: &MatchDecision) -> Self {
        AuditEntry::Decision {
            query_index: decision.query_index,
            query_id: decision.query_id.clone(),
            candidate_id: decision.best_candidate_id().map(str::to_string),
            composite: decision.composite(),
            state: decision.state,
            path: decision.path.clone(),
            tier: decision.tier,
            same_entity: decision.same_entity,
            confidence: decision.confidence,
            flags: decision.flags,
        }
    }
}

/// Records produced by one unit of work, stamped with the job id.
#[derive(Debug, Clone)]
pub struct AuditBuffer {
    job_id: Arc<str>,
    records: Vec<AuditRecord>,
}

impl AuditBuffer {
    pub fn new(job_id: Arc<str>) -> Self {
        Self {
            job_id,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: AuditEntry) {
        self.records.push(AuditRecord {
            schema_version: AUDIT_SCHEMA_VERSION,
            job_id: self.job_id.to_string(),
            recorded_at: Utc::now(),
            entry,
        });
    }

    pub fn append(&mut self, other: AuditBuffer) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AuditRecord> {
        self.records
    }
}

/// Destination for committed audit records. Implementations must make each
/// `append` atomic with respect to concurrent appends.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;

    fn append_all(&self, records: &[AuditRecord]) -> Result<(), AuditError> {
        for record in records {
            self.append(record)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// JSON Lines audit log. Each record is serialized first and then written
/// with a single `write_all` under the lock, so lines never interleave.
#[derive(Debug)]
pub struct JsonlAuditLog<W: Write + Send = File> {
    writer: Mutex<W>,
}

impl JsonlAuditLog<File> {
    /// Open `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write + Send> JsonlAuditLog<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> AuditSink for JsonlAuditLog<W> {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()?;
        Ok(())
    }
}

/// In-memory sink for tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn append_all(&self, records: &[AuditRecord]) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(records);
        Ok(())
    }
}
