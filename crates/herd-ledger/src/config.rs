//! Ledger configuration

use serde::{Deserialize, Serialize};

/// Tunables for the catalog state manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Fresh identifiers drawn before giving up on a collision streak.
    pub max_id_attempts: u32,
}

impl LedgerConfig {
    /// Default number of identifier draws per allocation
    pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 8;
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: Self::DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}
