//! Match recording
//!
//! Applies one finished comparison: read both items, run the rating model,
//! recompute the outcome counters and commit both items as a single unit.
//! Failures are returned to the caller untouched; retry policy lives above.

use crate::error::{ArenaError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::model::RatingModel;
use crate::storage::ItemRepository;
use crate::types::{Item, MatchOutcome, MatchResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies outcomes to stored items
#[derive(Clone)]
pub struct MatchRecorder {
    repository: Arc<dyn ItemRepository>,
    model: Arc<dyn RatingModel>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MatchRecorder {
    pub fn new(repository: Arc<dyn ItemRepository>, model: Arc<dyn RatingModel>) -> Self {
        Self {
            repository,
            model,
            metrics: None,
        }
    }

    /// Time every model update into the rating update histogram
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Apply one outcome and persist both items atomically
    pub async fn record(&self, winner_id: &str, loser_id: &str, is_draw: bool) -> Result<MatchResult> {
        if winner_id == loser_id {
            return Err(ArenaError::InvalidVote {
                reason: format!("item {} cannot be compared with itself", winner_id),
            });
        }

        let winner = self.repository.get_by_id(winner_id).await?;
        let loser = self.repository.get_by_id(loser_id).await?;

        self.record_items(winner, loser, is_draw).await
    }

    /// Apply one outcome to items the caller already read, and commit them
    ///
    /// The items must carry the versions they were read at; a concurrent
    /// write in between surfaces as `Conflict`.
    pub async fn record_items(&self, winner: Item, loser: Item, is_draw: bool) -> Result<MatchResult> {
        if winner.id == loser.id {
            return Err(ArenaError::InvalidVote {
                reason: format!("item {} cannot be compared with itself", winner.id),
            });
        }

        let (mut winner, mut loser) = self.apply(winner, loser, is_draw)?;

        if let Err(e) = self.repository.atomic_update(&winner, &loser).await {
            warn!(
                winner_id = %winner.id,
                loser_id = %loser.id,
                is_draw,
                error = %e,
                "Failed to commit match result"
            );
            return Err(e);
        }

        info!(
            winner_id = %winner.id,
            loser_id = %loser.id,
            is_draw,
            winner_mu = winner.skill.mu,
            winner_sigma = winner.skill.sigma,
            loser_mu = loser.skill.mu,
            loser_sigma = loser.skill.sigma,
            "Recorded match"
        );

        // The store bumped both versions on commit
        winner.version += 1;
        loser.version += 1;

        Ok(MatchResult {
            winner,
            loser,
            is_draw,
        })
    }

    /// Record a `MatchOutcome`
    pub async fn record_outcome(&self, outcome: &MatchOutcome) -> Result<MatchResult> {
        self.record(&outcome.winner_id, &outcome.loser_id, outcome.is_draw)
            .await
    }

    /// Compute the post-match state of both items without persisting it
    ///
    /// The returned items keep the versions they were read at, which is what
    /// the store compares against on commit.
    pub fn apply(&self, mut winner: Item, mut loser: Item, is_draw: bool) -> Result<(Item, Item)> {
        let timer = self.metrics.as_ref().map(|metrics| metrics.start_timer());
        let update = self.model.update(&winner.skill, &loser.skill, is_draw);
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            metrics.record_rating_update(timer.stop());
        }
        let (winner_skill, loser_skill) = update?;

        debug!(
            winner_id = %winner.id,
            loser_id = %loser.id,
            winner_shift = winner_skill.mu - winner.skill.mu,
            loser_shift = loser_skill.mu - loser.skill.mu,
            "Computed rating update"
        );

        winner.skill = winner_skill;
        loser.skill = loser_skill;

        if is_draw {
            winner.record = winner.record.with_draw();
            loser.record = loser.record.with_draw();
        } else {
            winner.record = winner.record.with_win();
            loser.record = loser.record.with_loss();
        }

        Ok((winner, loser))
    }
}
