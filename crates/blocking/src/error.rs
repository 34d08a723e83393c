use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockingError {
    #[error("invalid blocking config: {0}")]
    InvalidConfig(String),
    #[error("duplicate candidate id `{0}`")]
    DuplicateId(String),
}
