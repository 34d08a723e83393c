use std::cmp::Ordering;
use std::sync::Arc;

use blocking::BlockingIndex;
use normalize::{NormalizedName, Normalizer, RawName};
use similarity::{SimilarityScorer, SimilarityVector, Weights};
use tracing::debug;

use crate::types::{MatchCandidate, MatchError, ScoredQuery};

#[cfg(test)]
mod tests;

/// Scores a query against its block and ranks the results.
///
/// Holds only shared, read-only state, so one engine can serve every worker
/// thread of a job and identical inputs always produce identical rankings.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    normalizer: Arc<Normalizer>,
    index: Arc<BlockingIndex>,
    scorer: SimilarityScorer,
}

impl MatchEngine {
    /// Validates `weights` before any scoring can happen.
    pub fn new(
        normalizer: Arc<Normalizer>,
        index: Arc<BlockingIndex>,
        weights: Weights,
    ) -> Result<Self, MatchError> {
        let scorer = SimilarityScorer::new(weights)?;
        Ok(Self {
            normalizer,
            index,
            scorer,
        })
    }

    pub fn index(&self) -> &Arc<BlockingIndex> {
        &self.index
    }

    pub fn normalizer(&self) -> &Arc<Normalizer> {
        &self.normalizer
    }

    pub fn weights(&self) -> &Weights {
        self.scorer.weights()
    }

    /// Normalize and score a raw query.
    pub fn score_query(&self, query: &RawName) -> ScoredQuery {
        self.score_block(&self.normalizer.normalize_raw(query))
    }

    /// Score `query` against every member of its block (or of the global
    /// block when its own is empty) and rank all pairs.
    ///
    /// Ordering is composite descending; equal composites keep ascending
    /// candidate index, so the earlier candidate wins ties.
    pub fn score_block(&self, query: &NormalizedName) -> ScoredQuery {
        let lookup = self.index.lookup(query);

        let mut scored: Vec<(usize, SimilarityVector, f64)> = lookup
            .members
            .iter()
            .filter_map(|&pos| {
                let candidate = self.index.candidate(pos)?;
                let (vector, composite) = self.scorer.score(query, &candidate.name);
                Some((pos, vector, composite))
            })
            .collect();

        scored.sort_by(|a, b| rank_order((a.0, a.2), (b.0, b.2)));

        let candidates = scored
            .into_iter()
            .enumerate()
            .filter_map(|(i, (pos, vector, composite))| {
                let candidate = self.index.candidate(pos)?;
                Some(MatchCandidate {
                    query: query.clone(),
                    candidate_id: candidate.id.clone(),
                    candidate_index: pos,
                    candidate: candidate.name.clone(),
                    vector,
                    composite,
                    rank: i + 1,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            query = %query,
            block = %lookup.key,
            fallback = lookup.used_fallback,
            scored = candidates.len(),
            "block_scored"
        );

        ScoredQuery {
            query: query.clone(),
            block_key: lookup.key.clone(),
            used_fallback: lookup.used_fallback,
            candidates,
        }
    }

    /// The `top_k` best candidates for a raw query.
    pub fn find_best_matches(
        &self,
        query: &RawName,
        top_k: usize,
    ) -> Result<Vec<MatchCandidate>, MatchError> {
        if top_k == 0 {
            return Err(MatchError::InvalidConfig(
                "top_k must be greater than zero".into(),
            ));
        }
        Ok(self.score_query(query).into_top(top_k))
    }
}

/// Total order on `(candidate_index, composite)`: higher composite first,
/// then lower index.
pub fn rank_order(a: (usize, f64), b: (usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}
