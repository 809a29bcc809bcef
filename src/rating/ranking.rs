//! Conservative ranking score and leaderboard ordering

use crate::types::{Item, LeaderboardEntry, SkillEstimate};
use std::cmp::Ordering;

/// Number of standard deviations subtracted from the mean
pub const CONSERVATIVE_SIGMAS: f64 = 3.0;

/// Lower-confidence-bound score: `mu - 3 * sigma`
///
/// Items with few comparisons keep a high sigma and therefore rank low until
/// their estimate settles.
pub fn score(skill: &SkillEstimate) -> f64 {
    skill.mu - CONSERVATIVE_SIGMAS * skill.sigma
}

/// Rank the active items of a topic by score, best first
///
/// The sort is stable, so equal scores keep the order the items were given in.
pub fn leaderboard(items: &[Item]) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(f64, &Item)> = items
        .iter()
        .filter(|item| item.is_active())
        .map(|item| (item.score(), item))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (score, item))| LeaderboardEntry {
            rank: index + 1,
            item: item.clone(),
            score,
        })
        .collect()
}
