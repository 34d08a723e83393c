//! Name-pair similarity.
//!
//! [`score`] computes a [`SimilarityVector`] of seven independent metrics for
//! two normalized names; [`composite_score`] folds it into one ranking value
//! under a validated [`Weights`] set. Both are pure.
//!
//! ```rust
//! use normalize::{NormalizeConfig, Normalizer};
//! use similarity::{composite_score, score, Weights};
//!
//! let n = Normalizer::new(&NormalizeConfig::default()).unwrap();
//! let v = score(&n.normalize("ABC Corp."), &n.normalize("ABC Corporation"));
//! assert_eq!(v.exact_match, 100.0);
//! assert!(composite_score(&v, &Weights::default()) > 99.0);
//! ```

mod error;
mod metric;
mod phonetic;
mod ratio;
mod scorer;
mod weights;

pub use crate::error::SimilarityError;
pub use crate::metric::{Metric, SimilarityVector};
pub use crate::phonetic::{phonetic_key, phonetic_similarity, soundex};
pub use crate::ratio::{partial_ratio, ratio, token_set_ratio, token_sort_ratio};
pub use crate::scorer::{score, SimilarityScorer};
pub use crate::weights::{composite_score, Weights, WEIGHT_SUM_TOLERANCE};
