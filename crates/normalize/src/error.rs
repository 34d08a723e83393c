use thiserror::Error;

/// Errors raised while compiling a [`NormalizeConfig`](crate::NormalizeConfig).
///
/// Normalizing a name never fails; only dictionary validation does.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid normalization config: {0}")]
    InvalidConfig(String),
    #[error("abbreviation `{key}` is invalid: {reason}")]
    InvalidAbbreviation { key: String, reason: String },
    #[error("dictionary entry `{entry}` in {list} must normalize to exactly one token")]
    InvalidEntry { list: &'static str, entry: String },
}
