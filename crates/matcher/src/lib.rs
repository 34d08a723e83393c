//! # nameres matcher (`matcher`)
//!
//! Turns a query name into a ranked list of candidates from the job's
//! [`BlockingIndex`](blocking::BlockingIndex).
//!
//! ## Core Types
//!
//! - [`MatchEngine`]: normalizes the query, resolves its block (falling back
//!   to every candidate when the block is empty), scores each member and
//!   ranks the pairs.
//! - [`ScoredQuery`]: every scored pair for one query, best first, plus the
//!   block key used.
//! - [`MatchCandidate`]: one ranked pair with its similarity vector and
//!   composite score.
//! - [`MatchConfig`]: per-job knobs (`top_k`).
//!
//! ## Determinism
//!
//! Ranking sorts by composite descending using `f64::total_cmp`; ties go to
//! the candidate that appeared earlier in the input. The engine keeps no
//! mutable state, so reruns are bit-identical.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use blocking::{BlockingConfig, BlockingIndex, Candidate};
//! use normalize::{NormalizeConfig, Normalizer, RawName};
//! use similarity::Weights;
//! use matcher::MatchEngine;
//!
//! let normalizer = Arc::new(Normalizer::new(&NormalizeConfig::default()).unwrap());
//! let candidates = ["ABC Corporation", "XYZ Holdings"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, n)| Candidate {
//!         id: format!("c{i}"),
//!         raw: RawName::new(*n),
//!         name: normalizer.normalize(n),
//!     })
//!     .collect();
//! let index = Arc::new(BlockingIndex::build(candidates, &BlockingConfig::default()).unwrap());
//! let engine = MatchEngine::new(normalizer, index, Weights::default()).unwrap();
//!
//! let hits = engine.find_best_matches(&RawName::new("ABC Corp."), 1).unwrap();
//! assert_eq!(hits[0].candidate_id, "c0");
//! assert_eq!(hits[0].vector.exact_match, 100.0);
//! ```

mod engine;
mod types;

pub use crate::engine::{rank_order, MatchEngine};
pub use crate::types::{MatchCandidate, MatchConfig, MatchError, ScoredQuery};
