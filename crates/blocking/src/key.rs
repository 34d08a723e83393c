use std::fmt;

use normalize::NormalizedName;
use serde::{Deserialize, Serialize};

/// Coarse grouping key. Reserved keys are uppercase and can never collide
/// with keys derived from (always lowercase) normalized tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockKey(String);

impl BlockKey {
    pub const NUMERIC: &'static str = "NUMERIC";
    pub const UNKNOWN: &'static str = "UNKNOWN";
    pub const GLOBAL: &'static str = "GLOBAL";

    /// Wrap an explicit key, e.g. when inspecting a known block.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn numeric() -> Self {
        Self(Self::NUMERIC.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.into())
    }

    pub fn global() -> Self {
        Self(Self::GLOBAL.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.0.as_str(), Self::NUMERIC | Self::UNKNOWN | Self::GLOBAL)
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How names are assigned to blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockingStrategy {
    /// Leading character of the first token.
    #[default]
    FirstCharacter,
    /// First `len` characters of the first token.
    TokenPrefix { len: usize },
    /// A single block holding every candidate.
    Global,
}

impl BlockingStrategy {
    /// Derive the key for `name`. Total: every name maps to exactly one key.
    pub fn key_for(&self, name: &NormalizedName) -> BlockKey {
        let prefix_len = match self {
            BlockingStrategy::Global => return BlockKey::global(),
            BlockingStrategy::FirstCharacter => 1,
            BlockingStrategy::TokenPrefix { len } => (*len).max(1),
        };
        let Some(first) = name.first_token() else {
            return BlockKey::unknown();
        };
        match first.chars().next() {
            Some(c) if c.is_numeric() => BlockKey::numeric(),
            Some(c) if c.is_alphabetic() => BlockKey(first.chars().take(prefix_len).collect()),
            _ => BlockKey::unknown(),
        }
    }
}
