use serde::{Deserialize, Serialize};

use crate::error::SimilarityError;
use crate::metric::{Metric, SimilarityVector};

/// Tolerance on the weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-metric weights for the composite score.
///
/// Construct through deserialization or [`Weights::default`], then call
/// [`Weights::validate`] before scoring; a set that does not sum to 1.0 is a
/// configuration error, never silently renormalized.
///
/// The defaults favour token-set ratio, which tolerates the extra descriptor
/// tokens common in facility names, and keep first-token agreement at 10% so
/// a shared leading word ("saint", "university") cannot carry a pair alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub exact_match: f64,
    pub edit_ratio: f64,
    pub partial_ratio: f64,
    pub token_sort_ratio: f64,
    pub token_set_ratio: f64,
    pub phonetic: f64,
    pub first_token_match: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            exact_match: 0.10,
            edit_ratio: 0.15,
            partial_ratio: 0.15,
            token_sort_ratio: 0.15,
            token_set_ratio: 0.25,
            phonetic: 0.10,
            first_token_match: 0.10,
        }
    }
}

impl Weights {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ExactMatch => self.exact_match,
            Metric::EditRatio => self.edit_ratio,
            Metric::PartialRatio => self.partial_ratio,
            Metric::TokenSortRatio => self.token_sort_ratio,
            Metric::TokenSetRatio => self.token_set_ratio,
            Metric::Phonetic => self.phonetic,
            Metric::FirstTokenMatch => self.first_token_match,
        }
    }

    fn get_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::ExactMatch => &mut self.exact_match,
            Metric::EditRatio => &mut self.edit_ratio,
            Metric::PartialRatio => &mut self.partial_ratio,
            Metric::TokenSortRatio => &mut self.token_sort_ratio,
            Metric::TokenSetRatio => &mut self.token_set_ratio,
            Metric::Phonetic => &mut self.phonetic,
            Metric::FirstTokenMatch => &mut self.first_token_match,
        }
    }

    pub fn sum(&self) -> f64 {
        Metric::ALL.iter().map(|m| self.get(*m)).sum()
    }

    /// Reject non-finite or negative weights and sums outside 1.0 ± 1e-6.
    pub fn validate(&self) -> Result<(), SimilarityError> {
        for metric in Metric::ALL {
            let value = self.get(metric);
            if !value.is_finite() || value < 0.0 {
                return Err(SimilarityError::InvalidWeight {
                    metric: metric.as_str(),
                    value,
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SimilarityError::WeightSum { sum });
        }
        Ok(())
    }

    /// Raise `metric` by `delta` and scale every other weight by the same
    /// factor so the sum is unchanged.
    pub fn boosted(&self, metric: Metric, delta: f64) -> Result<Weights, SimilarityError> {
        let current = self.get(metric);
        let invalid = |reason| SimilarityError::InvalidBoost {
            metric: metric.as_str(),
            delta,
            reason,
        };
        if !delta.is_finite() || delta < 0.0 {
            return Err(invalid("delta must be finite and non-negative"));
        }
        let rest = 1.0 - current;
        let target = current + delta;
        if target > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(invalid("boosted weight would exceed 1.0"));
        }
        if rest <= WEIGHT_SUM_TOLERANCE {
            return if delta <= WEIGHT_SUM_TOLERANCE {
                Ok(*self)
            } else {
                Err(invalid("no remaining weight to redistribute"))
            };
        }

        let scale = (1.0 - target).max(0.0) / rest;
        let mut out = *self;
        for other in Metric::ALL {
            if other != metric {
                *out.get_mut(other) *= scale;
            }
        }
        *out.get_mut(metric) = target.min(1.0);
        Ok(out)
    }
}

/// `Σ vector[m] * weights[m]`, clamped to `[0, 100]` against float drift.
pub fn composite_score(vector: &SimilarityVector, weights: &Weights) -> f64 {
    let sum: f64 = Metric::ALL
        .iter()
        .map(|m| vector.get(*m) * weights.get(*m))
        .sum();
    sum.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_valid() {
        Weights::default().validate().expect("defaults validate");
    }

    #[test]
    fn rejects_bad_sum() {
        let w = Weights {
            first_token_match: 0.40,
            ..Weights::default()
        };
        assert!(matches!(w.validate(), Err(SimilarityError::WeightSum { .. })));
    }

    #[test]
    fn accepts_sum_within_tolerance() {
        let w = Weights {
            exact_match: 0.10 + 5e-7,
            ..Weights::default()
        };
        assert!(w.validate().is_ok());
    }

    #[test]
    fn rejects_negative_and_nan() {
        let w = Weights {
            exact_match: -0.1,
            edit_ratio: 0.35,
            ..Weights::default()
        };
        assert!(matches!(
            w.validate(),
            Err(SimilarityError::InvalidWeight { metric: "exact_match", .. })
        ));
        let w = Weights {
            phonetic: f64::NAN,
            ..Weights::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn boosted_keeps_sum() {
        let w = Weights::default()
            .boosted(Metric::TokenSetRatio, 0.2)
            .unwrap();
        assert!((w.token_set_ratio - 0.45).abs() < 1e-12);
        assert!(w.validate().is_ok());
        assert!(Weights::default().boosted(Metric::Phonetic, 0.95).is_err());
        assert!(Weights::default().boosted(Metric::Phonetic, -0.1).is_err());
    }

    #[test]
    fn boosting_a_strong_metric_never_lowers_composite() {
        let v = SimilarityVector {
            exact_match: 0.0,
            edit_ratio: 61.0,
            partial_ratio: 74.0,
            token_sort_ratio: 58.0,
            token_set_ratio: 100.0,
            phonetic: 66.7,
            first_token_match: 100.0,
        };
        let base = Weights::default();
        let before = composite_score(&v, &base);
        for metric in Metric::ALL {
            for delta in [0.01, 0.05, 0.2] {
                let after = composite_score(&v, &base.boosted(metric, delta).unwrap());
                if v.get(metric) > before {
                    assert!(after >= before - 1e-9, "{metric:?} +{delta}: {after} < {before}");
                } else if v.get(metric) < before {
                    assert!(after <= before + 1e-9, "{metric:?} +{delta}: {after} > {before}");
                }
            }
        }
    }

    #[test]
    fn composite_of_perfect_vector_is_100() {
        let v = SimilarityVector {
            exact_match: 100.0,
            edit_ratio: 100.0,
            partial_ratio: 100.0,
            token_sort_ratio: 100.0,
            token_set_ratio: 100.0,
            phonetic: 100.0,
            first_token_match: 100.0,
        };
        let c = composite_score(&v, &Weights::default());
        assert!((c - 100.0).abs() < 1e-9);
        assert_eq!(composite_score(&SimilarityVector::zero(), &Weights::default()), 0.0);
    }
}
