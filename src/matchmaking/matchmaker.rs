//! Two-stage pair sampler
//!
//! Stage one prefers the items whose skill is least known: item A is drawn
//! uniformly from the `uncertainty_pool` items with the highest sigma. Stage
//! two prefers unpredictable outcomes: item B is drawn uniformly from the
//! `closeness_pool` remaining items whose mean is nearest to A's. A fair coin
//! then decides which side each item is shown on.
//!
//! Sampling from a small pool instead of taking the single best candidate
//! keeps the same cluster of items from being paired over and over.

use crate::config::MatchmakingConfig;
use crate::error::{ArenaError, Result};
use crate::types::{Item, Pair};
use crate::utils::mu_distance;
use rand::Rng;
use std::cmp::Ordering;
use tracing::debug;

/// Selects the next pair to compare within a topic
#[derive(Debug, Clone, Default)]
pub struct Matchmaker {
    config: MatchmakingConfig,
}

impl Matchmaker {
    pub fn new(config: MatchmakingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    /// Active items ordered by sigma, most uncertain first
    ///
    /// Equal sigmas keep their input order.
    pub fn rank_by_uncertainty<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        let mut eligible: Vec<&Item> = items.iter().filter(|item| item.is_active()).collect();
        eligible.sort_by(|x, y| {
            y.skill
                .sigma
                .partial_cmp(&x.skill.sigma)
                .unwrap_or(Ordering::Equal)
        });
        eligible
    }

    /// Candidates ordered by distance of their mean to the anchor's, closest first
    pub fn rank_by_closeness<'a>(&self, anchor: &Item, candidates: &[&'a Item]) -> Vec<&'a Item> {
        let distance = |item: &Item| mu_distance(item.skill.mu, anchor.skill.mu);
        let mut rest: Vec<&Item> = candidates
            .iter()
            .copied()
            .filter(|item| item.id != anchor.id)
            .collect();
        rest.sort_by(|x, y| {
            distance(*x)
                .partial_cmp(&distance(*y))
                .unwrap_or(Ordering::Equal)
        });
        rest
    }

    /// Choose the next pair from a topic's items; retired items are ignored
    pub fn select_pair<R: Rng>(&self, items: &[Item], rng: &mut R) -> Result<Pair> {
        let insufficient = |eligible: usize| ArenaError::InsufficientItems {
            topic_id: items
                .first()
                .map(|item| item.topic_id.clone())
                .unwrap_or_default(),
            eligible,
        };

        let ranked = self.rank_by_uncertainty(items);
        if ranked.len() < 2 {
            return Err(insufficient(ranked.len()));
        }

        let top_n = self.config.uncertainty_pool.min(ranked.len());
        let item_a = ranked[rng.random_range(0..top_n)];

        let rest = self.rank_by_closeness(item_a, &ranked);
        if rest.is_empty() {
            // Every eligible entry shares A's id
            return Err(insufficient(1));
        }

        let match_n = self.config.closeness_pool.min(rest.len());
        let item_b = rest[rng.random_range(0..match_n)];

        let a_on_left = rng.random_bool(0.5);

        debug!(
            item_a = %item_a.id,
            item_b = %item_b.id,
            sigma_a = item_a.skill.sigma,
            mu_gap = mu_distance(item_a.skill.mu, item_b.skill.mu),
            eligible = ranked.len(),
            "Selected pair"
        );

        Ok(Pair {
            item_a: item_a.clone(),
            item_b: item_b.clone(),
            a_on_left,
        })
    }
}
