use super::*;
use std::sync::Arc;

use blocking::{BlockKey, BlockingConfig, BlockingStrategy, Candidate};
use normalize::NormalizeConfig;
use rayon::prelude::*;

fn normalizer() -> Arc<Normalizer> {
    Arc::new(Normalizer::new(&NormalizeConfig::default()).expect("default normalizer"))
}

fn build_engine(names: &[&str], cfg: BlockingConfig) -> MatchEngine {
    let normalizer = normalizer();
    let candidates = names
        .iter()
        .enumerate()
        .map(|(i, n)| Candidate {
            id: format!("cand-{i}"),
            raw: RawName::new(*n),
            name: normalizer.normalize(n),
        })
        .collect();
    let index = Arc::new(BlockingIndex::build(candidates, &cfg).expect("index builds"));
    MatchEngine::new(normalizer, index, Weights::default()).expect("engine builds")
}

fn blocked() -> BlockingConfig {
    BlockingConfig {
        strategy: BlockingStrategy::FirstCharacter,
        global_block_threshold: 0,
    }
}

const ROSTER: &[&str] = &[
    "Saint Marys Medical Center",
    "Saint Lukes Clinic",
    "Mercy General Hospital",
    "ABC Corporation",
    "Acme Widgets LLC",
    "Saint Marys Medical Center",
    "Sacred Heart Clinic",
];

#[test]
fn best_match_for_abbreviated_query() {
    let engine = build_engine(ROSTER, blocked());
    let hits = engine
        .find_best_matches(&RawName::new("St. Mary's Hospital"), 3)
        .expect("match");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].candidate.text(), "saint marys");
    assert!(hits[0].vector.token_set_ratio >= 80.0);
    assert_eq!(hits[0].query.text(), "saint marys hospital");
}

#[test]
fn equal_scores_prefer_earlier_candidate() {
    let engine = build_engine(ROSTER, blocked());
    let hits = engine
        .find_best_matches(&RawName::new("Saint Marys Medical Center"), 2)
        .expect("match");

    // candidates 0 and 5 are identical; index 0 must rank first
    assert_eq!(hits[0].candidate_index, 0);
    assert_eq!(hits[1].candidate_index, 5);
    assert_eq!(hits[0].composite, hits[1].composite);
    assert_eq!(hits[0].candidate_id, "cand-0");
}

#[test]
fn ranks_are_one_based_and_sorted() {
    let engine = build_engine(ROSTER, blocked());
    let scored = engine.score_query(&RawName::new("Saint Luke's Clinic"));

    assert_eq!(scored.block_key, BlockKey::new("s"));
    assert!(!scored.used_fallback);
    // every "s" candidate is scored, not just the top-K
    assert_eq!(scored.candidates.len(), 4);
    for (i, c) in scored.candidates.iter().enumerate() {
        assert_eq!(c.rank, i + 1);
    }
    for pair in scored.candidates.windows(2) {
        assert!(pair[0].composite >= pair[1].composite);
    }
    assert_eq!(scored.best().map(|c| c.candidate_id.as_str()), Some("cand-1"));
}

#[test]
fn empty_block_falls_back_to_global() {
    let engine = build_engine(ROSTER, blocked());
    let scored = engine.score_query(&RawName::new("Zebra LLC"));

    assert!(scored.used_fallback);
    assert_eq!(scored.block_key, BlockKey::global());
    assert_eq!(scored.candidates.len(), ROSTER.len());
    assert!(scored.best().is_some_and(|c| c.composite < 50.0));
}

#[test]
fn top_k_truncates_and_zero_is_rejected() {
    let engine = build_engine(ROSTER, BlockingConfig::default());
    let hits = engine
        .find_best_matches(&RawName::new("Mercy General"), 2)
        .expect("match");
    assert_eq!(hits.len(), 2);

    let err = engine
        .find_best_matches(&RawName::new("Mercy General"), 0)
        .expect_err("top_k 0 invalid");
    assert!(matches!(err, MatchError::InvalidConfig(_)));
}

#[test]
fn empty_index_yields_no_candidates() {
    let engine = build_engine(&[], BlockingConfig::default());
    let scored = engine.score_query(&RawName::new("Acme"));
    assert!(scored.candidates.is_empty());
    assert!(scored.best().is_none());
}

#[test]
fn invalid_weights_rejected_before_scoring() {
    let weights = Weights {
        first_token_match: 0.4,
        ..Weights::default()
    };
    let index = Arc::new(BlockingIndex::build(Vec::new(), &BlockingConfig::default()).unwrap());
    let err = MatchEngine::new(normalizer(), index, weights).expect_err("weights invalid");
    assert!(matches!(err, MatchError::Similarity(_)));
}

#[test]
fn reruns_are_bit_identical_across_threads() {
    let engine = build_engine(ROSTER, blocked());
    let queries = [
        "St. Mary's Hospital",
        "Saint Marys Medical Center",
        "ABC Corp.",
        "Acme Inc",
        "Mercy Gen. Hosp.",
    ];

    let sequential: Vec<ScoredQuery> = queries
        .iter()
        .map(|q| engine.score_query(&RawName::new(*q)))
        .collect();

    for _ in 0..4 {
        let parallel: Vec<ScoredQuery> = queries
            .par_iter()
            .map(|q| engine.score_query(&RawName::new(*q)))
            .collect();
        assert_eq!(parallel, sequential);

        let seq_json = serde_json::to_string(&sequential).unwrap();
        let par_json = serde_json::to_string(&parallel).unwrap();
        assert_eq!(seq_json, par_json);
    }
}

#[test]
fn rank_order_is_total_for_nan() {
    use std::cmp::Ordering;
    assert_eq!(rank_order((0, 90.0), (1, 80.0)), Ordering::Less);
    assert_eq!(rank_order((3, 80.0), (1, 80.0)), Ordering::Greater);
    // NaN sorts consistently instead of poisoning the sort
    assert_eq!(rank_order((0, f64::NAN), (0, f64::NAN)), Ordering::Equal);
}
