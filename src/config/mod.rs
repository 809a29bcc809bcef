//! Configuration management for the arena
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the model and matchmaker.

pub mod app;
pub mod matchmaking;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use matchmaking::MatchmakingConfig;
pub use rating::RatingConfig;
