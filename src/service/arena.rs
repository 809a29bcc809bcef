//! Arena service coordination
//!
//! The arena service is the request-facing side of the system: it serves the
//! next pair of a topic, applies votes, and answers leaderboard and score
//! queries. It owns the conflict policy: a vote that collides with a
//! concurrent write is retried once from fresh state, then surfaced.

use crate::config::AppConfig;
use crate::error::{ArenaError, Result};
use crate::matchmaking::Matchmaker;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::rating::{leaderboard, MatchRecorder, RatingModel, TrueSkillModel};
use crate::storage::ItemRepository;
use crate::types::{
    Item, ItemStatus, LeaderboardEntry, MatchResult, Pair, ScoreCard, VoteReceipt, VoteRequest,
};
use crate::utils::generate_item_id;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// A conflicting vote is attempted at most this many times
const MAX_VOTE_ATTEMPTS: u32 = 2;

/// Request-facing entry point of the arena
pub struct ArenaService {
    repository: Arc<dyn ItemRepository>,
    model: Arc<TrueSkillModel>,
    matchmaker: Matchmaker,
    recorder: MatchRecorder,
    rng: Mutex<StdRng>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ArenaService {
    /// Build the service from configuration and a store
    pub fn new(config: &AppConfig, repository: Arc<dyn ItemRepository>) -> Result<Self> {
        let model = Arc::new(TrueSkillModel::new(config.rating.clone())?);
        let matchmaker = Matchmaker::new(config.matchmaking.clone())?;
        let recorder = MatchRecorder::new(repository.clone(), model.clone());

        let rng = match config.matchmaking.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            repository,
            model,
            matchmaker,
            recorder,
            rng: Mutex::new(rng),
            metrics: None,
        })
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.recorder = self.recorder.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn model(&self) -> &TrueSkillModel {
        &self.model
    }

    pub fn repository(&self) -> Arc<dyn ItemRepository> {
        self.repository.clone()
    }

    /// Add a new item to a topic with the prior skill estimate
    pub async fn add_item(&self, topic_id: &str, item_id: &str, title: &str) -> Result<Item> {
        let item = Item::new(item_id, topic_id, title, self.model.initial_skill());
        self.repository.insert(item.clone()).await?;
        info!(topic_id, item_id, "Added item");
        Ok(item)
    }

    /// Add a new item under a freshly generated id
    pub async fn create_item(&self, topic_id: &str, title: &str) -> Result<Item> {
        self.add_item(topic_id, &generate_item_id(), title).await
    }

    /// Exclude an item from matchmaking and ranking, keeping its history
    pub async fn retire_item(&self, item_id: &str) -> Result<Item> {
        let item = self
            .repository
            .set_status(item_id, ItemStatus::Retired)
            .await?;
        info!(item_id, "Retired item");
        Ok(item)
    }

    /// Bring a retired item back
    pub async fn restore_item(&self, item_id: &str) -> Result<Item> {
        let item = self
            .repository
            .set_status(item_id, ItemStatus::Active)
            .await?;
        info!(item_id, "Restored item");
        Ok(item)
    }

    /// Choose the next pair to show for a topic
    pub async fn next_pair(&self, topic_id: &str) -> Result<Pair> {
        let timer = MetricsTimer::start();
        let items = self.repository.get_eligible(topic_id).await?;

        match self.select(topic_id, &items) {
            Ok(pair) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_pair_served(timer.elapsed());
                }
                Ok(pair)
            }
            Err(e) => {
                warn!(topic_id, error = %e, "Could not serve a pair");
                if let Some(metrics) = &self.metrics {
                    metrics.record_pair_failure(e.kind());
                }
                Err(e)
            }
        }
    }

    fn select(&self, topic_id: &str, items: &[Item]) -> Result<Pair> {
        let mut rng = self.rng.lock().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire matchmaking rng lock".to_string(),
        })?;

        self.matchmaker
            .select_pair(items, &mut *rng)
            .map_err(|e| match e {
                // Report the requested topic even when the list was empty
                ArenaError::InsufficientItems { eligible, .. } => ArenaError::InsufficientItems {
                    topic_id: topic_id.to_string(),
                    eligible,
                },
                other => other,
            })
    }

    /// Apply a vote, retrying once from fresh state on a storage conflict
    pub async fn submit_vote(&self, vote: &VoteRequest) -> Result<VoteReceipt> {
        let timer = MetricsTimer::start();
        let mut attempt = 1;

        loop {
            match self.try_vote(vote).await {
                Ok((result, mu_shift)) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_vote(vote.is_draw, mu_shift, timer.elapsed());
                    }
                    info!(
                        topic_id = %vote.topic_id,
                        voter_id = vote.voter_id.as_deref().unwrap_or("anonymous"),
                        winner_id = %vote.winner_id,
                        loser_id = %vote.loser_id,
                        is_draw = vote.is_draw,
                        attempts = attempt,
                        "Vote applied"
                    );

                    let winner_card = ScoreCard::from(&result.winner);
                    let loser_card = ScoreCard::from(&result.loser);
                    return Ok(VoteReceipt {
                        result,
                        winner_card,
                        loser_card,
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_retryable() && attempt < MAX_VOTE_ATTEMPTS => {
                    warn!(
                        topic_id = %vote.topic_id,
                        attempt,
                        error = %e,
                        "Vote conflicted with a concurrent update, retrying"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_conflict_retry();
                    }
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        topic_id = %vote.topic_id,
                        winner_id = %vote.winner_id,
                        loser_id = %vote.loser_id,
                        attempts = attempt,
                        error = %e,
                        "Vote rejected"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_vote_failure(e.kind());
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn try_vote(&self, vote: &VoteRequest) -> Result<(MatchResult, f64)> {
        if vote.winner_id == vote.loser_id {
            return Err(ArenaError::InvalidVote {
                reason: format!("item {} cannot be compared with itself", vote.winner_id),
            });
        }

        let winner = self.repository.get_by_id(&vote.winner_id).await?;
        let loser = self.repository.get_by_id(&vote.loser_id).await?;

        for item in [&winner, &loser] {
            if item.topic_id != vote.topic_id {
                return Err(ArenaError::InvalidVote {
                    reason: format!(
                        "item {} belongs to topic {}, not {}",
                        item.id, item.topic_id, vote.topic_id
                    ),
                });
            }
            if !item.is_active() {
                return Err(ArenaError::InvalidVote {
                    reason: format!("item {} is retired", item.id),
                });
            }
        }

        let previous_mu = winner.skill.mu;
        let result = self.recorder.record_items(winner, loser, vote.is_draw).await?;
        let mu_shift = result.winner.skill.mu - previous_mu;

        debug!(winner_id = %vote.winner_id, mu_shift, "Vote committed");
        Ok((result, mu_shift))
    }

    /// Active items of a topic ranked by conservative score
    pub async fn leaderboard(&self, topic_id: &str) -> Result<Vec<LeaderboardEntry>> {
        let items = self.repository.get_eligible(topic_id).await?;
        Ok(leaderboard(&items))
    }

    /// Current score and record of an item
    pub async fn score_card(&self, item_id: &str) -> Result<ScoreCard> {
        let item = self.repository.get_by_id(item_id).await?;
        Ok(ScoreCard::from(&item))
    }
}
