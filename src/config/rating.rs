//! Rating model configuration

use crate::error::{ArenaError, Result};
use crate::types::SkillEstimate;
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillConfig;

/// Prior mean of a new item
pub const DEFAULT_MU: f64 = 25.0;

/// Prior standard deviation of a new item
pub const DEFAULT_SIGMA: f64 = 25.0 / 3.0;

/// Prior probability of a draw between equal items
pub const DEFAULT_DRAW_PROBABILITY: f64 = 0.1;

/// Constants of the TrueSkill model
///
/// When loaded from a file, a missing `beta` is derived from the loaded
/// `sigma0`, matching the environment overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RatingConfigFile")]
pub struct RatingConfig {
    /// Initial mean for new items
    pub mu0: f64,
    /// Initial standard deviation for new items
    pub sigma0: f64,
    /// Performance noise of a single comparison, conventionally `sigma0 / 2`
    pub beta: f64,
    /// Sets the draw margin
    pub draw_probability: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self::with_prior(DEFAULT_MU, DEFAULT_SIGMA)
    }
}

/// On-disk form of `RatingConfig`; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RatingConfigFile {
    mu0: Option<f64>,
    sigma0: Option<f64>,
    beta: Option<f64>,
    draw_probability: Option<f64>,
}

impl From<RatingConfigFile> for RatingConfig {
    fn from(file: RatingConfigFile) -> Self {
        let mut config = Self::with_prior(
            file.mu0.unwrap_or(DEFAULT_MU),
            file.sigma0.unwrap_or(DEFAULT_SIGMA),
        );
        if let Some(beta) = file.beta {
            config.beta = beta;
        }
        if let Some(draw_probability) = file.draw_probability {
            config.draw_probability = draw_probability;
        }
        config
    }
}

impl RatingConfig {
    /// Build a configuration from a prior, deriving `beta = sigma0 / 2`
    pub fn with_prior(mu0: f64, sigma0: f64) -> Self {
        Self {
            mu0,
            sigma0,
            beta: sigma0 / 2.0,
            draw_probability: DEFAULT_DRAW_PROBABILITY,
        }
    }

    /// Skill estimate assigned to newly added items
    pub fn initial_skill(&self) -> SkillEstimate {
        SkillEstimate::new(self.mu0, self.sigma0)
    }

    /// Parameters handed to skillratings. Dynamics stay at zero: ratings never decay.
    pub fn trueskill_config(&self) -> TrueSkillConfig {
        TrueSkillConfig {
            draw_probability: self.draw_probability,
            beta: self.beta,
            default_dynamics: 0.0,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.mu0.is_finite() {
            return Err(ArenaError::ConfigurationError {
                message: "mu0 must be finite".to_string(),
            });
        }

        if !(self.sigma0.is_finite() && self.sigma0 > 0.0) {
            return Err(ArenaError::ConfigurationError {
                message: "sigma0 must be positive".to_string(),
            });
        }

        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(ArenaError::ConfigurationError {
                message: "beta must be positive".to_string(),
            });
        }

        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(ArenaError::ConfigurationError {
                message: "draw_probability must be in [0, 1)".to_string(),
            });
        }

        Ok(())
    }
}
