//! Matchmaking configuration

use crate::error::{ArenaError, Result};
use serde::{Deserialize, Serialize};

/// Pool sizes of the two-stage pair sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    /// How many of the most uncertain items item A is drawn from
    pub uncertainty_pool: usize,
    /// How many of the closest-mu items item B is drawn from
    pub closeness_pool: usize,
    /// Fixed RNG seed for reproducible pairing; entropy-seeded when unset
    pub seed: Option<u64>,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            uncertainty_pool: 5,
            closeness_pool: 3,
            seed: None,
        }
    }
}

impl MatchmakingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.uncertainty_pool == 0 {
            return Err(ArenaError::ConfigurationError {
                message: "uncertainty_pool must be at least 1".to_string(),
            });
        }
        if self.closeness_pool == 0 {
            return Err(ArenaError::ConfigurationError {
                message: "closeness_pool must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
