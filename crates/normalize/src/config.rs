//! Configuration for the name normalization pipeline.
//!
//! [`NormalizeConfig`] carries the three domain dictionaries (abbreviations,
//! corporate suffixes, stopwords) plus a behaviour version. It is plain data:
//! compile it once with [`Normalizer::new`](crate::Normalizer::new), which
//! validates every entry, then share the compiled normalizer.
//!
//! # Versioning
//!
//! Bump `version` whenever a dictionary or rule change alters output, so
//! audit records produced under different dictionaries stay distinguishable.
//!
//! # Examples
//!
//! ```rust
//! use normalize::{NormalizeConfig, Normalizer};
//!
//! let mut cfg = NormalizeConfig::default();
//! cfg.abbreviations.insert("mem".into(), "memorial".into());
//!
//! let normalizer = Normalizer::new(&cfg).unwrap();
//! assert_eq!(normalizer.normalize("Mem. Hosp.").text(), "memorial hospital");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dictionaries::{DEFAULT_ABBREVIATIONS, DEFAULT_STOPWORDS, DEFAULT_SUFFIXES};

/// Dictionaries and version for [`Normalizer`](crate::Normalizer).
///
/// Missing fields fall back to the built-in dictionaries, so a YAML section
/// only needs the lists it overrides:
///
/// ```yaml
/// normalization:
///   suffixes: [inc, llc, gmbh]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Behaviour version. Must be >= 1; 0 is reserved.
    pub version: u32,
    /// Abbreviation → expansion. Ordered so compiled output is reproducible.
    pub abbreviations: BTreeMap<String, String>,
    /// Corporate suffixes stripped when they are the trailing token.
    pub suffixes: Vec<String>,
    /// Tokens removed wherever they occur.
    pub stopwords: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            abbreviations: DEFAULT_ABBREVIATIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NormalizeConfig {
    /// A config with no dictionaries: only character folding and tokenizing.
    pub fn bare() -> Self {
        Self {
            version: 1,
            abbreviations: BTreeMap::new(),
            suffixes: Vec::new(),
            stopwords: Vec::new(),
        }
    }
}
