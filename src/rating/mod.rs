//! Rating system integration using TrueSkill
//!
//! This module provides the pairwise skill update, the conservative ranking
//! score, and the recorder that applies a finished comparison to storage.

pub mod model;
pub mod ranking;
pub mod recorder;
pub mod trueskill;

// Re-export commonly used types
pub use model::RatingModel;
pub use ranking::{leaderboard, score};
pub use recorder::MatchRecorder;
pub use trueskill::TrueSkillModel;
