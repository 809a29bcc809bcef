//! Error types for the arena
//!
//! Library operations return `ArenaError` values through the `Result` alias so
//! callers can branch on the failure kind. Application edges (configuration
//! loading, the binary) use anyhow.

use crate::types::{ItemId, TopicId};

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Failure kinds surfaced by matchmaking, rating and persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArenaError {
    #[error("Not enough items in topic {topic_id}: {eligible} eligible, need 2")]
    InsufficientItems { topic_id: TopicId, eligible: usize },

    #[error("Item not found: {item_id}")]
    NotFound { item_id: ItemId },

    #[error("Concurrent update conflict on item {item_id}")]
    Conflict { item_id: ItemId },

    #[error("Numeric instability in rating update: {reason}")]
    NumericInstability { reason: String },

    #[error("Invalid vote: {reason}")]
    InvalidVote { reason: String },

    #[error("Item already exists: {item_id}")]
    DuplicateItem { item_id: ItemId },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ArenaError {
    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ArenaError::InsufficientItems { .. } => "insufficient_items",
            ArenaError::NotFound { .. } => "not_found",
            ArenaError::Conflict { .. } => "conflict",
            ArenaError::NumericInstability { .. } => "numeric_instability",
            ArenaError::InvalidVote { .. } => "invalid_vote",
            ArenaError::DuplicateItem { .. } => "duplicate_item",
            ArenaError::ConfigurationError { .. } => "configuration",
            ArenaError::InternalError { .. } => "internal",
        }
    }

    /// Whether the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArenaError::Conflict { .. })
    }
}
