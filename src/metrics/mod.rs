//! Metrics for the arena
//!
//! This module provides Prometheus metrics for matchmaking, vote recording
//! and rating update latency.

pub mod collector;

pub use collector::{
    MatchmakingMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, VoteMetrics,
};
