//! Rating model trait
//!
//! A rating model turns one pairwise outcome into two updated skill
//! estimates. Implementations must be pure: no state, no I/O.

use crate::error::Result;
use crate::types::SkillEstimate;

/// Trait for pairwise skill updates
pub trait RatingModel: Send + Sync {
    /// Compute updated estimates for a finished comparison
    ///
    /// # Arguments
    /// * `winner` - Estimate of the preferred item (or either side of a draw)
    /// * `loser` - Estimate of the other item
    /// * `is_draw` - Whether the comparison was a tie
    ///
    /// # Returns
    /// `(new_winner, new_loser)`, or `NumericInstability` if the result is not
    /// a valid pair of distributions
    fn update(
        &self,
        winner: &SkillEstimate,
        loser: &SkillEstimate,
        is_draw: bool,
    ) -> Result<(SkillEstimate, SkillEstimate)>;

    /// Estimate assigned to newly added items
    fn initial_skill(&self) -> SkillEstimate;
}
