use serde::{Deserialize, Serialize};

use crate::error::BlockingError;
use crate::key::BlockingStrategy;

/// Blocking configuration.
///
/// ```yaml
/// blocking:
///   strategy: { type: token_prefix, len: 2 }
///   global_block_threshold: 64
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    pub strategy: BlockingStrategy,
    /// Below this many candidates everything goes into one `GLOBAL` block.
    pub global_block_threshold: usize,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            strategy: BlockingStrategy::FirstCharacter,
            global_block_threshold: 64,
        }
    }
}

impl BlockingConfig {
    pub fn validate(&self) -> Result<(), BlockingError> {
        if let BlockingStrategy::TokenPrefix { len: 0 } = self.strategy {
            return Err(BlockingError::InvalidConfig(
                "token_prefix len must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// The strategy actually applied to a candidate set of `candidates` names.
    pub fn effective_strategy(&self, candidates: usize) -> BlockingStrategy {
        if candidates < self.global_block_threshold {
            BlockingStrategy::Global
        } else {
            self.strategy
        }
    }
}
