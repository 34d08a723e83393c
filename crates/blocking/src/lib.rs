//! Blocking: partition candidate names by a cheap key so each query is only
//! scored against its own block instead of the full candidate set.
//!
//! The default key is the leading character of the first normalized token,
//! with reserved keys for numeric leads (`NUMERIC`) and empty or
//! non-alphanumeric leads (`UNKNOWN`). Candidate sets smaller than
//! `global_block_threshold` skip blocking entirely and use one `GLOBAL` block.
//! A query whose block is empty is compared against every candidate.

mod config;
mod error;
mod index;
mod key;

pub use crate::config::BlockingConfig;
pub use crate::error::BlockingError;
pub use crate::index::{BlockLookup, BlockingIndex, Candidate, ReductionReport};
pub use crate::key::{BlockKey, BlockingStrategy};
