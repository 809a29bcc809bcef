//! Common types used throughout the arena

use crate::config::rating::{DEFAULT_MU, DEFAULT_SIGMA};
use crate::rating::ranking::score;
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use std::fmt;

/// Unique identifier for items (videos)
pub type ItemId = String;

/// Unique identifier for topics
pub type TopicId = String;

/// Gaussian belief over an item's latent skill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillEstimate {
    pub mu: f64,
    pub sigma: f64,
}

impl SkillEstimate {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Conservative ranking score, `mu - 3 * sigma`
    pub fn score(&self) -> f64 {
        score(self)
    }
}

impl Default for SkillEstimate {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl From<TrueSkillRating> for SkillEstimate {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<SkillEstimate> for TrueSkillRating {
    fn from(skill: SkillEstimate) -> Self {
        Self {
            rating: skill.mu,
            uncertainty: skill.sigma,
        }
    }
}

/// Whether an item takes part in matchmaking and ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Active,
    Retired,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Active => write!(f, "active"),
            ItemStatus::Retired => write!(f, "retired"),
        }
    }
}

/// Outcome counters of an item. `match_count` is always derived from the other three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_count: u64,
    pub win_count: u64,
    pub loss_count: u64,
    pub draw_count: u64,
}

impl MatchRecord {
    fn from_counts(win_count: u64, loss_count: u64, draw_count: u64) -> Self {
        Self {
            match_count: win_count + loss_count + draw_count,
            win_count,
            loss_count,
            draw_count,
        }
    }

    pub fn with_win(&self) -> Self {
        Self::from_counts(self.win_count + 1, self.loss_count, self.draw_count)
    }

    pub fn with_loss(&self) -> Self {
        Self::from_counts(self.win_count, self.loss_count + 1, self.draw_count)
    }

    pub fn with_draw(&self) -> Self {
        Self::from_counts(self.win_count, self.loss_count, self.draw_count + 1)
    }

    /// Check `match_count == win_count + loss_count + draw_count`
    pub fn is_consistent(&self) -> bool {
        self.match_count == self.win_count + self.loss_count + self.draw_count
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matches, {} wins {} losses {} draws",
            self.match_count, self.win_count, self.loss_count, self.draw_count
        )
    }
}

/// A rankable item (e.g. a video) within a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub topic_id: TopicId,
    pub title: String,
    pub status: ItemStatus,
    pub skill: SkillEstimate,
    pub record: MatchRecord,
    /// Optimistic concurrency token, bumped by the store on every committed write
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Create a new active item with zero counters
    pub fn new(
        id: impl Into<ItemId>,
        topic_id: impl Into<TopicId>,
        title: impl Into<String>,
        skill: SkillEstimate,
    ) -> Self {
        Self {
            id: id.into(),
            topic_id: topic_id.into(),
            title: title.into(),
            status: ItemStatus::Active,
            skill,
            record: MatchRecord::default(),
            version: 0,
            created_at: current_timestamp(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ItemStatus::Active
    }

    pub fn score(&self) -> f64 {
        self.skill.score()
    }
}

/// Outcome of one completed comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner_id: ItemId,
    pub loser_id: ItemId,
    /// When set, winner and loser are only labels
    pub is_draw: bool,
}

/// Two items selected for comparison, with their display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    /// The uncertainty-first pick
    pub item_a: Item,
    /// The closest-skill opponent
    pub item_b: Item,
    pub a_on_left: bool,
}

impl Pair {
    pub fn left(&self) -> &Item {
        if self.a_on_left {
            &self.item_a
        } else {
            &self.item_b
        }
    }

    pub fn right(&self) -> &Item {
        if self.a_on_left {
            &self.item_b
        } else {
            &self.item_a
        }
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.item_a.id == item_id || self.item_b.id == item_id
    }
}

/// Score and record of an item as shown after a vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub item_id: ItemId,
    pub score: f64,
    pub record: MatchRecord,
}

impl From<&Item> for ScoreCard {
    fn from(item: &Item) -> Self {
        Self {
            item_id: item.id.clone(),
            score: item.score(),
            record: item.record,
        }
    }
}

/// One row of a topic leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub item: Item,
    pub score: f64,
}

/// Result of applying one outcome: both items as committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Item,
    pub loser: Item,
    pub is_draw: bool,
}

/// A vote as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub topic_id: TopicId,
    pub winner_id: ItemId,
    pub loser_id: ItemId,
    pub is_draw: bool,
    /// Audit only, never read by the rating logic
    pub voter_id: Option<String>,
}

impl VoteRequest {
    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome {
            winner_id: self.winner_id.clone(),
            loser_id: self.loser_id.clone(),
            is_draw: self.is_draw,
        }
    }
}

/// What a successful vote returns to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub result: MatchResult,
    pub winner_card: ScoreCard,
    pub loser_card: ScoreCard,
    /// Number of attempts the vote needed (1, or 2 after a conflict)
    pub attempts: u32,
}
