mod common;

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use adjudicator::testing::FnAdjudicator;
use nameres::{
    AUDIT_SCHEMA_VERSION, Adjudicators, AuditEntry, AuditRecord, JsonlAuditLog, MemoryAuditLog,
    NameRecord, ParallelCoordinator,
};
use tempfile::tempdir;

use common::{ambiguous_queries, job_config, roster, verdict};

fn mixed_queries() -> Vec<NameRecord> {
    let mut queries = ambiguous_queries(4);
    queries.push(NameRecord::new("abc", "ABC Corp."));
    queries.push(NameRecord::new("acme", "Acme Inc"));
    queries
}

#[tokio::test]
async fn jsonl_log_records_every_pair_call_and_decision() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");

    let tier2 = Arc::new(FnAdjudicator::new("reasoning", |_| Ok(verdict(84, true))));
    let coordinator = ParallelCoordinator::new(
        job_config(100, 100).prepare().unwrap(),
        Adjudicators::none().with_tier2(tier2.clone()),
    )
    .unwrap()
    .with_job_id("job-audit")
    .with_audit_sink(Arc::new(JsonlAuditLog::open(&path).unwrap()));

    let queries = mixed_queries();
    let report = coordinator.run(queries.clone(), roster()).await.unwrap();
    assert_eq!(report.job_id, "job-audit");

    let body = fs::read_to_string(&path).unwrap();
    let records: Vec<AuditRecord> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(records.iter().all(|r| r.schema_version == AUDIT_SCHEMA_VERSION));
    assert!(records.iter().all(|r| r.job_id == "job-audit"));

    let mut kinds: HashMap<&str, usize> = HashMap::new();
    for r in &records {
        *kinds.entry(r.entry.kind()).or_default() += 1;
    }
    assert_eq!(kinds["pair_scored"], queries.len() * roster().len());
    assert_eq!(kinds["adjudication_call"], tier2.calls());
    assert_eq!(kinds["decision"], queries.len());

    // Chunks may commit in any order, but each query's records stay
    // together and end with its decision.
    let mut runs: Vec<(usize, &AuditEntry)> = Vec::new();
    for r in &records {
        let index = r.entry.query_index();
        if runs.last().is_some_and(|run| run.0 == index) {
            runs.pop();
        }
        runs.push((index, &r.entry));
    }
    assert_eq!(runs.len(), queries.len());
    assert!(
        runs.iter()
            .all(|(_, last)| matches!(last, AuditEntry::Decision { .. }))
    );

    let first: serde_json::Value = serde_json::from_str(body.lines().next().unwrap()).unwrap();
    assert_eq!(first["kind"], "pair_scored");
    assert!(first["recorded_at"].is_string());
}

#[tokio::test]
async fn reopened_log_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");

    for job in ["first", "second"] {
        let coordinator = ParallelCoordinator::new(
            job_config(0, 0).prepare().unwrap(),
            Adjudicators::none(),
        )
        .unwrap()
        .with_job_id(job)
        .with_audit_sink(Arc::new(JsonlAuditLog::open(&path).unwrap()));
        coordinator
            .run(vec![NameRecord::new("abc", "ABC Corp.")], roster())
            .await
            .unwrap();
    }

    let jobs: Vec<String> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<AuditRecord>(line).unwrap().job_id)
        .collect();
    let per_job = 1 + roster().len();
    assert_eq!(jobs.len(), 2 * per_job);
    assert!(jobs[..per_job].iter().all(|j| j == "first"));
    assert!(jobs[per_job..].iter().all(|j| j == "second"));
}

#[tokio::test]
async fn top_k_only_when_not_recording_all_pairs() {
    let mut config = job_config(0, 0);
    config.audit.record_all_pairs = false;
    config.matching.top_k = 2;

    let audit = Arc::new(MemoryAuditLog::new());
    let coordinator = ParallelCoordinator::new(config.prepare().unwrap(), Adjudicators::none())
        .unwrap()
        .with_audit_sink(audit.clone());
    let queries = mixed_queries();
    let report = coordinator.run(queries.clone(), roster()).await.unwrap();

    let ranks: Vec<usize> = audit
        .records()
        .iter()
        .filter_map(|r| match &r.entry {
            AuditEntry::PairScored { rank, .. } => Some(*rank),
            _ => None,
        })
        .collect();
    assert_eq!(ranks.len(), queries.len() * 2);
    assert!(ranks.iter().all(|&rank| rank <= 2));

    // Scoring still covers the whole block.
    assert_eq!(report.stats.pairs_scored, (queries.len() * roster().len()) as u64);
    assert!(report.decisions.iter().all(|d| d.candidates.len() == 2));
}
