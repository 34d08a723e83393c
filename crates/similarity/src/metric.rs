use std::fmt;

use serde::{Deserialize, Serialize};

/// The independent similarity metrics, in their fixed reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ExactMatch,
    EditRatio,
    PartialRatio,
    TokenSortRatio,
    TokenSetRatio,
    Phonetic,
    FirstTokenMatch,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::ExactMatch,
        Metric::EditRatio,
        Metric::PartialRatio,
        Metric::TokenSortRatio,
        Metric::TokenSetRatio,
        Metric::Phonetic,
        Metric::FirstTokenMatch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::ExactMatch => "exact_match",
            Metric::EditRatio => "edit_ratio",
            Metric::PartialRatio => "partial_ratio",
            Metric::TokenSortRatio => "token_sort_ratio",
            Metric::TokenSetRatio => "token_set_ratio",
            Metric::Phonetic => "phonetic",
            Metric::FirstTokenMatch => "first_token_match",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-metric scores for one name pair, each in `[0, 100]`.
///
/// Field order matches [`Metric::ALL`] so serialized vectors are stable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityVector {
    pub exact_match: f64,
    pub edit_ratio: f64,
    pub partial_ratio: f64,
    pub token_sort_ratio: f64,
    pub token_set_ratio: f64,
    pub phonetic: f64,
    pub first_token_match: f64,
}

impl SimilarityVector {
    pub fn zero() -> Self {
        Self::default()
    }

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

    /// `(metric, score)` pairs in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}
