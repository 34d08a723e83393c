mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use adjudicator::testing::FnAdjudicator;
use nameres::{
    Adjudicators, AuditEntry, CancelFlag, ChunkProgress, DecisionState, JobConfig, MatchDecision,
    MemoryAuditLog, Metric, NameRecord, ParallelCoordinator, Tier,
};

use common::{AMBIGUOUS, ambiguous_queries, job_config, roster, verdict};

async fn resolve_one(
    config: JobConfig,
    adjudicators: Adjudicators,
    query: &str,
    candidates: Vec<NameRecord>,
) -> MatchDecision {
    let coordinator = ParallelCoordinator::new(config.prepare().unwrap(), adjudicators).unwrap();
    let mut report = coordinator
        .run(vec![NameRecord::new("q0", query)], candidates)
        .await
        .unwrap();
    assert_eq!(report.decisions.len(), 1);
    report.decisions.remove(0)
}

#[tokio::test]
async fn abbreviation_expansion_lands_in_escalation_band() {
    let tier2 = Arc::new(FnAdjudicator::new("reasoning", |req| {
        assert_eq!(req.name_a, "St. Mary's Hospital");
        assert_eq!(req.name_b, "Saint Marys Medical Center");
        Ok(verdict(91, true))
    }));
    let adjudicators = Adjudicators::none().with_tier2(tier2.clone());

    let decision =
        resolve_one(job_config(10, 10), adjudicators, "St. Mary's Hospital", roster()).await;

    let best = decision.best.as_ref().unwrap();
    assert_eq!(best.candidate_id, "npi-100");
    assert!(best.vector.get(Metric::TokenSetRatio) >= 80.0);
    assert!(best.composite >= 50.0 && best.composite < 90.0);

    assert_eq!(tier2.calls(), 1);
    assert_eq!(decision.state, DecisionState::Resolved);
    assert_eq!(
        decision.path,
        vec![
            DecisionState::Scored,
            DecisionState::EscalatedTier2,
            DecisionState::Resolved
        ]
    );
    assert_eq!(decision.tier, Tier::Reasoning);
    assert_eq!(decision.matched_id(), Some("npi-100"));
    assert_eq!(decision.adjudication.as_ref().unwrap().confidence, 91);
}

#[tokio::test]
async fn suffix_stripping_gives_conclusive_match_without_calls() {
    let tier2 = Arc::new(FnAdjudicator::new("reasoning", |_| Ok(verdict(99, true))));
    let tier3 = Arc::new(FnAdjudicator::new("evidence", |_| Ok(verdict(99, true))));
    let adjudicators = Adjudicators::none()
        .with_tier2(tier2.clone())
        .with_tier3(tier3.clone());

    let decision = resolve_one(job_config(10, 10), adjudicators, "ABC Corp.", roster()).await;

    let best = decision.best.as_ref().unwrap();
    assert_eq!(best.candidate_id, "duns-200");
    assert_eq!(best.vector.get(Metric::ExactMatch), 100.0);
    assert!(best.composite >= 90.0);

    assert_eq!(decision.state, DecisionState::Conclusive);
    assert_eq!(decision.tier, Tier::Deterministic);
    assert!(decision.same_entity);
    assert_eq!(tier2.calls(), 0);
    assert_eq!(tier3.calls(), 0);
}

#[tokio::test]
async fn unrelated_names_give_conclusive_non_match() {
    let tier2 = Arc::new(FnAdjudicator::new("reasoning", |_| Ok(verdict(99, true))));
    let adjudicators = Adjudicators::none().with_tier2(tier2.clone());

    let decision = resolve_one(
        job_config(10, 10),
        adjudicators,
        "Acme Inc",
        vec![NameRecord::new("duns-300", "Zebra LLC")],
    )
    .await;

    assert!(decision.composite() < 50.0);
    assert_eq!(decision.state, DecisionState::Conclusive);
    assert!(!decision.same_entity);
    assert_eq!(decision.matched_id(), None);
    assert_eq!(tier2.calls(), 0);
}

#[tokio::test]
async fn zero_tier2_budget_leaves_ambiguous_pairs_unadjudicated() {
    let tier2 = Arc::new(FnAdjudicator::new("reasoning", |_| Ok(verdict(99, true))));
    let tier3 = Arc::new(FnAdjudicator::new("evidence", |_| Ok(verdict(99, true))));
    let adjudicators = Adjudicators::none()
        .with_tier2(tier2.clone())
        .with_tier3(tier3.clone());

    let coordinator =
        ParallelCoordinator::new(job_config(0, 10).prepare().unwrap(), adjudicators).unwrap();
    let report = coordinator
        .run(ambiguous_queries(AMBIGUOUS.len()), roster())
        .await
        .unwrap();

    assert_eq!(tier2.calls(), 0);
    assert_eq!(tier3.calls(), 0);
    assert_eq!(report.decisions.len(), AMBIGUOUS.len());
    for (decision, (_, expected)) in report.decisions.iter().zip(AMBIGUOUS) {
        assert_eq!(decision.best_candidate_id(), Some(expected));
        assert_eq!(decision.state, DecisionState::Unadjudicated);
        assert!(decision.flags.budget_exhausted);
        assert!(decision.flags.unadjudicated);
        assert!(decision.adjudication.is_none());
    }
    assert_eq!(report.stats.budget_exhausted, AMBIGUOUS.len());
    assert_eq!(report.stats.tier2_calls, 0);
}

#[tokio::test]
async fn cancellation_keeps_only_completed_chunks() {
    let mut config = job_config(10, 10);
    config.workers.chunk_size = 2;
    config.workers.cpu_pool_size = 1;

    let audit = Arc::new(MemoryAuditLog::new());
    let coordinator = ParallelCoordinator::new(config.prepare().unwrap(), Adjudicators::none())
        .unwrap()
        .with_audit_sink(audit.clone());
    let cancel = coordinator.cancel_flag();
    let coordinator =
        coordinator.with_progress(Arc::new(move |_: &ChunkProgress| cancel.cancel()));

    let report = coordinator.run(ambiguous_queries(10), roster()).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.chunks_total, 5);
    assert_eq!(report.chunks_completed, 1);
    let ids: Vec<&str> = report.decisions.iter().map(|d| d.query_id.as_str()).collect();
    assert_eq!(ids, ["q0", "q1"]);

    let records = audit.records();
    assert!(records.iter().all(|r| r.entry.query_index() < 2));
    let decisions: Vec<usize> = records
        .iter()
        .filter(|r| matches!(r.entry, AuditEntry::Decision { .. }))
        .map(|r| r.entry.query_index())
        .collect();
    assert_eq!(decisions, [0, 1]);
}

#[tokio::test]
async fn chunk_cancelled_mid_flight_is_discarded() {
    let mut config = job_config(10, 10);
    config.workers.chunk_size = 3;
    config.workers.cpu_pool_size = 1;

    let cancel = CancelFlag::new();
    let trip = cancel.clone();
    let tier2 = Arc::new(FnAdjudicator::new("reasoning", move |_| {
        trip.cancel();
        Ok(verdict(95, true))
    }));

    let audit = Arc::new(MemoryAuditLog::new());
    let coordinator = ParallelCoordinator::new(
        config.prepare().unwrap(),
        Adjudicators::none().with_tier2(tier2.clone()),
    )
    .unwrap()
    .with_cancel_flag(cancel)
    .with_audit_sink(audit.clone());

    let report = coordinator.run(ambiguous_queries(9), roster()).await.unwrap();

    assert!(report.cancelled);
    assert!(report.decisions.is_empty());
    assert_eq!(report.chunks_completed, 0);
    assert_eq!(report.chunks_total, 3);
    assert!(audit.is_empty());
    assert_eq!(tier2.calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn chunk_finished_before_cancel_is_kept_when_joined_later() {
    let mut config = job_config(10, 10);
    config.workers.chunk_size = 1;
    config.workers.cpu_pool_size = 2;

    let tier2 = Arc::new(
        FnAdjudicator::new("reasoning", |_| Ok(verdict(95, true)))
            .with_delay(Duration::from_millis(10)),
    );
    let coordinator = ParallelCoordinator::new(
        config.prepare().unwrap(),
        Adjudicators::none().with_tier2(tier2.clone()),
    )
    .unwrap();
    let cancel = coordinator.cancel_flag();
    let first = Arc::new(AtomicBool::new(true));
    // The first progress callback holds the join loop long enough for the
    // other running chunk to finish, then cancels.
    let coordinator = coordinator.with_progress(Arc::new(move |_: &ChunkProgress| {
        if first.swap(false, Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(300));
            cancel.cancel();
        }
    }));

    let queries = vec![
        NameRecord::new("abc", "ABC Corp."),
        NameRecord::new("q1", AMBIGUOUS[0].0),
        NameRecord::new("zebra", "Zebra LLC"),
    ];
    let report = coordinator.run(queries, roster()).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.chunks_total, 3);
    assert_eq!(report.chunks_completed, 2);
    let ids: Vec<&str> = report.decisions.iter().map(|d| d.query_id.as_str()).collect();
    assert_eq!(ids, ["abc", "q1"]);
    assert_eq!(tier2.calls(), 1);
}
