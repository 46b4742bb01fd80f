//! Rollback ledger sizing.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bounded undo log configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct LedgerConfig {
    /// Number of allocations remembered for rollback. Older entries are
    /// silently forgotten once this is reached.
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
