//! Main application configuration
//!
//! This module defines the top-level configuration of the arena, including
//! environment variable loading, TOML file loading and validation.

use crate::config::{MatchmakingConfig, RatingConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub matchmaking: MatchmakingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "duel-arena".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| env::var(name).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_overrides(|name| env::var(name).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Service settings
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings. A new sigma0 re-derives beta unless beta is set explicitly.
        if let Some(mu0) = lookup("RATING_MU0") {
            self.rating.mu0 = parse_var("RATING_MU0", &mu0)?;
        }
        if let Some(sigma0) = lookup("RATING_SIGMA0") {
            self.rating.sigma0 = parse_var("RATING_SIGMA0", &sigma0)?;
            self.rating.beta = self.rating.sigma0 / 2.0;
        }
        if let Some(beta) = lookup("RATING_BETA") {
            self.rating.beta = parse_var("RATING_BETA", &beta)?;
        }
        if let Some(draw) = lookup("RATING_DRAW_PROBABILITY") {
            self.rating.draw_probability = parse_var("RATING_DRAW_PROBABILITY", &draw)?;
        }

        // Matchmaking settings
        if let Some(pool) = lookup("MATCHMAKING_UNCERTAINTY_POOL") {
            self.matchmaking.uncertainty_pool = parse_var("MATCHMAKING_UNCERTAINTY_POOL", &pool)?;
        }
        if let Some(pool) = lookup("MATCHMAKING_CLOSENESS_POOL") {
            self.matchmaking.closeness_pool = parse_var("MATCHMAKING_CLOSENESS_POOL", &pool)?;
        }
        if let Some(seed) = lookup("MATCHMAKING_SEED") {
            self.matchmaking.seed = Some(parse_var("MATCHMAKING_SEED", &seed)?);
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;
    config.matchmaking.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.matchmaking.uncertainty_pool, 5);
        assert_eq!(config.matchmaking.closeness_pool, 3);
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("LOG_LEVEL", "debug"),
                ("RATING_SIGMA0", "4.0"),
                ("MATCHMAKING_SEED", "42"),
            ]))
            .unwrap();

        assert_eq!(config.service.log_level, "debug");
        assert_eq!(config.rating.sigma0, 4.0);
        assert_eq!(config.rating.beta, 2.0);
        assert_eq!(config.matchmaking.seed, Some(42));
    }

    #[test]
    fn test_explicit_beta_wins_over_derived() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[("RATING_SIGMA0", "4.0"), ("RATING_BETA", "3.5")]))
            .unwrap();
        assert_eq!(config.rating.beta, 3.5);
    }

    #[test]
    fn test_invalid_override_values() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(lookup_from(&[("MATCHMAKING_CLOSENESS_POOL", "many")]))
            .is_err());

        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.matchmaking.uncertainty_pool = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let raw = r#"
            [service]
            log_level = "warn"

            [rating]
            draw_probability = 0.05

            [matchmaking]
            closeness_pool = 4
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.service.log_level, "warn");
        assert_eq!(config.service.name, "duel-arena");
        assert_eq!(config.rating.draw_probability, 0.05);
        assert_eq!(config.rating.mu0, 25.0);
        assert_eq!(config.matchmaking.closeness_pool, 4);
        assert_eq!(config.matchmaking.uncertainty_pool, 5);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_toml_sigma0_derives_beta() {
        let config: AppConfig = toml::from_str("[rating]\nsigma0 = 4.0\n").unwrap();
        assert_eq!(config.rating.sigma0, 4.0);
        assert_eq!(config.rating.beta, 2.0);
        assert_eq!(config.rating.mu0, 25.0);
        assert_eq!(config.rating.draw_probability, 0.1);

        let config: AppConfig =
            toml::from_str("[rating]\nsigma0 = 4.0\nbeta = 3.5\n").unwrap();
        assert_eq!(config.rating.beta, 3.5);

        // File and environment agree on the same setting
        let mut from_env = AppConfig::default();
        from_env
            .apply_overrides(lookup_from(&[("RATING_SIGMA0", "4.0")]))
            .unwrap();
        let from_file: AppConfig = toml::from_str("[rating]\nsigma0 = 4.0\n").unwrap();
        assert_eq!(from_env.rating, from_file.rating);
    }
}
