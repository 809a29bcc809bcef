//! Duel Arena - pairwise comparison ranking
//!
//! This crate ranks a topic's items from head-to-head votes: a TrueSkill
//! model updates each item's skill distribution, a conservative score orders
//! the leaderboard, and a two-stage sampler picks the next pair to show.

pub mod config;
pub mod error;
pub mod matchmaking;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{ArenaError, Result};
pub use types::*;

// Re-export key components
pub use matchmaking::Matchmaker;
pub use rating::{MatchRecorder, RatingModel, TrueSkillModel};
pub use service::ArenaService;
pub use storage::{InMemoryItemRepository, ItemRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
