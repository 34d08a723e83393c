use normalize::NormalizedName;

use crate::error::SimilarityError;
use crate::metric::SimilarityVector;
use crate::phonetic::phonetic_similarity;
use crate::ratio::{partial_ratio, ratio, token_set_ratio, token_sort_ratio};
use crate::weights::{composite_score, Weights};

/// Compute every metric for a normalized pair.
///
/// Each metric is independent of the others. If either name is empty every
/// metric is 0.
pub fn score(a: &NormalizedName, b: &NormalizedName) -> SimilarityVector {
    if a.is_empty() || b.is_empty() {
        return SimilarityVector::zero();
    }

    let exact_match = if a.text() == b.text() { 100.0 } else { 0.0 };
    let first_token_match = if a.first_token() == b.first_token() {
        100.0
    } else {
        0.0
    };

    SimilarityVector {
        exact_match,
        edit_ratio: ratio(a.text(), b.text()),
        partial_ratio: partial_ratio(a.text(), b.text()),
        token_sort_ratio: token_sort_ratio(a.tokens(), b.tokens()),
        token_set_ratio: token_set_ratio(a.tokens(), b.tokens()),
        phonetic: phonetic_similarity(a.tokens(), b.tokens()),
        first_token_match,
    }
}

/// Scores pairs under one validated weight set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScorer {
    weights: Weights,
}

impl SimilarityScorer {
    pub fn new(weights: Weights) -> Result<Self, SimilarityError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn score(&self, a: &NormalizedName, b: &NormalizedName) -> (SimilarityVector, f64) {
        let vector = score(a, b);
        let composite = composite_score(&vector, &self.weights);
        (vector, composite)
    }
}
