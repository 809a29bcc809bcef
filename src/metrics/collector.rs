//! Metrics collection using Prometheus
//!
//! This module provides metrics for pair serving, vote recording and rating
//! update latency.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the arena
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Matchmaking metrics
    matchmaking_metrics: MatchmakingMetrics,

    /// Vote-related metrics
    vote_metrics: VoteMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Matchmaking metrics
#[derive(Clone)]
pub struct MatchmakingMetrics {
    /// Total pairs served
    pub pairs_served_total: IntCounter,

    /// Pair requests that could not be served, by reason
    pub pair_failures_total: IntCounterVec,
}

/// Vote-related metrics
#[derive(Clone)]
pub struct VoteMetrics {
    /// Committed votes by outcome (decisive, draw)
    pub votes_recorded_total: IntCounterVec,

    /// Rejected votes by reason
    pub vote_failures_total: IntCounterVec,

    /// Votes retried after a storage conflict
    pub conflict_retries_total: IntCounter,

    /// Absolute mean shift of the winning side
    pub mu_shift: Histogram,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time to read, update and commit one vote
    pub vote_duration: Histogram,

    /// Time to select one pair
    pub pair_selection_duration: Histogram,

    /// Time spent in the rating model for one outcome
    pub rating_update_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let matchmaking_metrics = MatchmakingMetrics::new(&registry)?;
        let vote_metrics = VoteMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            matchmaking_metrics,
            vote_metrics,
            performance_metrics,
        })
    }

    pub fn matchmaking(&self) -> &MatchmakingMetrics {
        &self.matchmaking_metrics
    }

    pub fn votes(&self) -> &VoteMetrics {
        &self.vote_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a pair being served
    pub fn record_pair_served(&self, duration: Duration) {
        self.matchmaking_metrics.pairs_served_total.inc();
        self.performance_metrics
            .pair_selection_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a pair request that failed
    pub fn record_pair_failure(&self, reason: &str) {
        self.matchmaking_metrics
            .pair_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a committed vote
    pub fn record_vote(&self, is_draw: bool, mu_shift: f64, duration: Duration) {
        let outcome = if is_draw { "draw" } else { "decisive" };

        self.vote_metrics
            .votes_recorded_total
            .with_label_values(&[outcome])
            .inc();
        self.vote_metrics.mu_shift.observe(mu_shift.abs());
        self.performance_metrics
            .vote_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a vote that was not committed
    pub fn record_vote_failure(&self, reason: &str) {
        self.vote_metrics
            .vote_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record the time one rating model update took
    pub fn record_rating_update(&self, duration: Duration) {
        self.performance_metrics
            .rating_update_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a vote retried after a conflict
    pub fn record_conflict_retry(&self) {
        self.vote_metrics.conflict_retries_total.inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::start()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    /// Start timing now
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl MatchmakingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let pairs_served_total =
            IntCounter::new("duel_arena_pairs_served_total", "Total pairs served")?;
        registry.register(Box::new(pairs_served_total.clone()))?;

        let pair_failures_total = IntCounterVec::new(
            Opts::new(
                "duel_arena_pair_failures_total",
                "Pair requests that could not be served",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(pair_failures_total.clone()))?;

        Ok(Self {
            pairs_served_total,
            pair_failures_total,
        })
    }
}

impl VoteMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let votes_recorded_total = IntCounterVec::new(
            Opts::new("duel_arena_votes_recorded_total", "Committed votes"),
            &["outcome"],
        )?;
        registry.register(Box::new(votes_recorded_total.clone()))?;

        let vote_failures_total = IntCounterVec::new(
            Opts::new("duel_arena_vote_failures_total", "Rejected votes"),
            &["reason"],
        )?;
        registry.register(Box::new(vote_failures_total.clone()))?;

        let conflict_retries_total = IntCounter::new(
            "duel_arena_conflict_retries_total",
            "Votes retried after a storage conflict",
        )?;
        registry.register(Box::new(conflict_retries_total.clone()))?;

        let mu_shift = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_mu_shift",
                "Absolute mean shift of the winning item per vote",
            )
            .buckets(vec![0.01, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0]),
        )?;
        registry.register(Box::new(mu_shift.clone()))?;

        Ok(Self {
            votes_recorded_total,
            vote_failures_total,
            conflict_retries_total,
            mu_shift,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let vote_duration = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_vote_duration_seconds",
                "Time to read, update and commit one vote",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(vote_duration.clone()))?;

        let pair_selection_duration = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_pair_selection_duration_seconds",
                "Time to select one pair",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(pair_selection_duration.clone()))?;

        let rating_update_duration = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_rating_update_duration_seconds",
                "Time spent in the rating model for one outcome",
            )
            .buckets(vec![0.000001, 0.000005, 0.00001, 0.00005, 0.0001, 0.0005, 0.001]),
        )?;
        registry.register(Box::new(rating_update_duration.clone()))?;

        Ok(Self {
            vote_duration,
            pair_selection_duration,
            rating_update_duration,
        })
    }
}
