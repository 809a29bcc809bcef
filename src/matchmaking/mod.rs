//! Pair selection for pairwise comparisons
//!
//! This module decides which two items of a topic are shown next, trading
//! information gain against pairing diversity.

pub mod matchmaker;

pub use matchmaker::Matchmaker;
