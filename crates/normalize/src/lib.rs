//! Deterministic name canonicalization for entity resolution.
//!
//! Names arriving from different ledgers spell the same organization in many
//! ways: "St. Mary's Hospital", "SAINT MARYS MEDICAL CENTER", "Saint Mary's
//! Hosp.". This crate folds them to a comparable token sequence.
//!
//! ## Pipeline
//!
//! 1. Character folding: lowercase, NFKD, drop combining marks
//! 2. Tokenizing: split on whitespace and separator punctuation; periods and
//!    apostrophes are elided, hyphens kept inside tokens
//! 3. Abbreviation expansion, longest key first (`st` → `saint`)
//! 4. Trailing corporate suffix removal (`inc`, `llc`, ...), keeping at least
//!    one token
//! 5. Stopword removal
//!
//! Steps 3-5 repeat until the token sequence stops changing.
//!
//! ## Guarantees
//!
//! - Pure: no I/O, clock or locale dependence
//! - Idempotent: `normalize(normalize(x).text()) == normalize(x)`
//! - Total: every input yields a (possibly empty) [`NormalizedName`]

mod config;
mod dictionaries;
mod error;
mod name;
mod pipeline;
mod token;

pub use crate::config::NormalizeConfig;
pub use crate::dictionaries::{DEFAULT_ABBREVIATIONS, DEFAULT_STOPWORDS, DEFAULT_SUFFIXES};
pub use crate::error::NormalizeError;
pub use crate::name::{NormalizedName, RawName};
pub use crate::pipeline::Normalizer;
pub use crate::token::{fold_and_tokenize, fold_characters, tokenize};

#[cfg(test)]
mod tests {
    use super::*;

    fn default_normalizer() -> Normalizer {
        Normalizer::new(&NormalizeConfig::default()).expect("default config compiles")
    }

    #[test]
    fn healthcare_variants_converge() {
        let n = default_normalizer();
        assert_eq!(n.normalize("St. Mary's Hospital").text(), "saint marys hospital");
        assert_eq!(n.normalize("Saint Marys Medical Center").text(), "saint marys");
        assert_eq!(n.normalize("SAINT MARY'S HOSP.").text(), "saint marys hospital");
    }

    #[test]
    fn corporate_suffixes_are_stripped() {
        let n = default_normalizer();
        assert_eq!(n.normalize("ABC Corp.").text(), "abc");
        assert_eq!(n.normalize("ABC Corporation").text(), "abc");
        assert_eq!(n.normalize("ABC Co., Inc.").text(), "abc");
        assert_eq!(n.normalize("Acme Holdings LLC").text(), "acme holdings");
    }

    #[test]
    fn suffix_stripping_keeps_last_token() {
        let n = default_normalizer();
        assert_eq!(n.normalize("Company").text(), "company");
        assert_eq!(n.normalize("Inc. Ltd.").text(), "inc");
    }

    #[test]
    fn multi_token_abbreviation_wins_over_single() {
        let n = default_normalizer();
        let out = n.normalize("The Univ. of Chicago Med. Ctr.");
        assert_eq!(out.text(), "university chicago");
        assert_eq!(out.tokens(), &["university", "chicago"]);
    }

    #[test]
    fn abbreviation_with_internal_apostrophe() {
        let n = default_normalizer();
        assert_eq!(n.normalize("Int'l Mfg. Grp").text(), "international manufacturing group");
    }

    #[test]
    fn empty_and_punctuation_only_inputs() {
        let n = default_normalizer();
        assert!(n.normalize("").is_empty());
        assert!(n.normalize("   \t\n").is_empty());
        assert!(n.normalize("...,,,---").is_empty());
        assert!(n.normalize("The of and").is_empty());
        assert_eq!(n.normalize("").first_token(), None);
    }

    #[test]
    fn invalid_utf8_bytes_yield_empty() {
        let n = default_normalizer();
        assert!(n.normalize_bytes(&[0xff, 0xfe, 0x41]).is_empty());
        assert_eq!(n.normalize_bytes("ABC Inc".as_bytes()).text(), "abc");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = default_normalizer();
        let inputs = [
            "St. Mary's Hospital",
            "Saint Marys Medical Center",
            "ℌoly ℭross Hosp.",
            "İstanbul Üniversitesi",
            "Straße GmbH",
            "ﬁrst ﬂoor Assoc.",
            "Med Ctr of St. Louis",
            "  --Wilkes--Barre-- General  ",
            "Ｆｕｌｌｗｉｄｔｈ Ｃｏｒｐ",
            "O\u{2019}Brien & Sons, Ltd.",
            "Dept. of Natl. Svcs.",
            "",
            "!!!",
        ];
        for input in inputs {
            let once = n.normalize(input);
            let twice = n.normalize(once.text());
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn normalization_is_deterministic_across_instances() {
        let a = default_normalizer();
        let b = default_normalizer();
        for input in ["St. Mary's Hospital", "ABC Corp.", "Café Zürich AG"] {
            assert_eq!(a.normalize(input), b.normalize(input));
        }
    }

    #[test]
    fn raw_name_uses_text_only() {
        let n = default_normalizer();
        let raw = RawName::new("St. Mary's Hospital")
            .with_context("Springfield, IL")
            .with_source("cms-2024");
        assert_eq!(n.normalize_raw(&raw).text(), "saint marys hospital");
    }

    #[test]
    fn rejects_version_zero() {
        let cfg = NormalizeConfig {
            version: 0,
            ..NormalizeConfig::default()
        };
        assert!(matches!(
            Normalizer::new(&cfg),
            Err(NormalizeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_cyclic_abbreviations() {
        let mut cfg = NormalizeConfig::bare();
        cfg.abbreviations.insert("ab".into(), "cd".into());
        cfg.abbreviations.insert("cd".into(), "ab".into());
        assert!(matches!(
            Normalizer::new(&cfg),
            Err(NormalizeError::InvalidAbbreviation { .. })
        ));

        let mut cfg = NormalizeConfig::default();
        cfg.abbreviations.insert("stl".into(), "st louis".into());
        assert!(matches!(
            Normalizer::new(&cfg),
            Err(NormalizeError::InvalidAbbreviation { .. })
        ));
    }

    #[test]
    fn rejects_colliding_and_empty_abbreviations() {
        let mut cfg = NormalizeConfig::bare();
        cfg.abbreviations.insert("St.".into(), "saint".into());
        cfg.abbreviations.insert("st".into(), "street".into());
        assert!(Normalizer::new(&cfg).is_err());

        let mut cfg = NormalizeConfig::bare();
        cfg.abbreviations.insert("...".into(), "dots".into());
        assert!(Normalizer::new(&cfg).is_err());
    }

    #[test]
    fn rejects_multi_token_suffix_entries() {
        let mut cfg = NormalizeConfig::default();
        cfg.suffixes.push("and co".into());
        assert_eq!(
            Normalizer::new(&cfg).unwrap_err(),
            NormalizeError::InvalidEntry {
                list: "suffixes",
                entry: "and co".into()
            }
        );
    }

    #[test]
    fn bare_config_only_folds() {
        let n = Normalizer::new(&NormalizeConfig::bare()).unwrap();
        assert_eq!(n.normalize("The St. Mary's Corp.").text(), "the st marys corp");
    }

    #[test]
    fn config_roundtrips_through_json_with_defaults() {
        let cfg: NormalizeConfig = serde_json::from_str(r#"{"suffixes":["inc"]}"#).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.suffixes, vec!["inc".to_string()]);
        assert_eq!(cfg.stopwords, NormalizeConfig::default().stopwords);
    }
}
