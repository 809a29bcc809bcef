//! TrueSkill rating model implementation
//!
//! This module provides the concrete rating model using the two-player
//! TrueSkill update from the skillratings crate. Each item's performance in a
//! comparison is a Gaussian around its mean with variance `beta^2`; the
//! outcome truncates the performance difference (at the draw margin for a
//! win, inside it for a draw) and the resulting moment-matched corrections
//! move the means and shrink the deviations.

use crate::config::RatingConfig;
use crate::error::{ArenaError, Result};
use crate::rating::model::RatingModel;
use crate::types::SkillEstimate;
use skillratings::trueskill::{
    expected_score, match_quality, trueskill, TrueSkillConfig, TrueSkillRating,
};
use skillratings::Outcomes;
use tracing::error;

/// Relative slack allowed when checking that sigma did not grow
const SIGMA_GROWTH_TOLERANCE: f64 = 1e-9;

/// TrueSkill rating model
#[derive(Debug, Clone)]
pub struct TrueSkillModel {
    config: RatingConfig,
    trueskill_config: TrueSkillConfig,
}

impl TrueSkillModel {
    /// Create a new model from validated constants
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;

        let trueskill_config = config.trueskill_config();
        Ok(Self {
            config,
            trueskill_config,
        })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Probability of each side winning, `(p_a, p_b)`, summing to 1
    pub fn expected_score(&self, a: &SkillEstimate, b: &SkillEstimate) -> (f64, f64) {
        let a: TrueSkillRating = (*a).into();
        let b: TrueSkillRating = (*b).into();
        expected_score(&a, &b, &self.trueskill_config)
    }

    /// Quality of a pairing in `(0, 1]`: the draw likelihood relative to two
    /// identical, perfectly known items. Close, uncertain pairs score high.
    pub fn match_quality(&self, a: &SkillEstimate, b: &SkillEstimate) -> f64 {
        let a: TrueSkillRating = (*a).into();
        let b: TrueSkillRating = (*b).into();
        match_quality(&a, &b, &self.trueskill_config)
    }
}

fn check_input(role: &str, skill: &SkillEstimate) -> Result<()> {
    if !skill.mu.is_finite() || !skill.sigma.is_finite() || skill.sigma <= 0.0 {
        let reason = format!(
            "{} input is not a valid distribution (mu={}, sigma={})",
            role, skill.mu, skill.sigma
        );
        error!(role, mu = skill.mu, sigma = skill.sigma, %reason, "Rating update rejected");
        return Err(ArenaError::NumericInstability { reason });
    }
    Ok(())
}

fn check_output(role: &str, before: &SkillEstimate, after: &SkillEstimate) -> Result<()> {
    let reason = if !after.mu.is_finite() || !after.sigma.is_finite() {
        Some(format!(
            "{} update is not finite (mu={}, sigma={})",
            role, after.mu, after.sigma
        ))
    } else if after.sigma <= 0.0 {
        Some(format!("{} sigma collapsed to {}", role, after.sigma))
    } else if after.sigma > before.sigma * (1.0 + SIGMA_GROWTH_TOLERANCE) {
        Some(format!(
            "{} sigma grew from {} to {}",
            role, before.sigma, after.sigma
        ))
    } else {
        None
    };

    match reason {
        Some(reason) => {
            error!(role, mu = before.mu, sigma = before.sigma, %reason, "Rating update rejected");
            Err(ArenaError::NumericInstability { reason })
        }
        None => Ok(()),
    }
}

impl RatingModel for TrueSkillModel {
    fn update(
        &self,
        winner: &SkillEstimate,
        loser: &SkillEstimate,
        is_draw: bool,
    ) -> Result<(SkillEstimate, SkillEstimate)> {
        check_input("winner", winner)?;
        check_input("loser", loser)?;

        let outcome = if is_draw {
            Outcomes::DRAW
        } else {
            Outcomes::WIN
        };

        let (new_winner, new_loser) = trueskill(
            &(*winner).into(),
            &(*loser).into(),
            &outcome,
            &self.trueskill_config,
        );

        let new_winner = SkillEstimate::from(new_winner);
        let new_loser = SkillEstimate::from(new_loser);

        check_output("winner", winner, &new_winner)?;
        check_output("loser", loser, &new_loser)?;

        Ok((new_winner, new_loser))
    }

    fn initial_skill(&self) -> SkillEstimate {
        self.config.initial_skill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model() -> TrueSkillModel {
        TrueSkillModel::new(RatingConfig::default()).unwrap()
    }

    #[test]
    fn test_model_creation() {
        let model = model();
        let initial = model.initial_skill();
        assert_eq!(initial.mu, 25.0);
        assert!((initial.sigma - 25.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = RatingConfig::default();
        config.beta = -1.0;
        assert!(TrueSkillModel::new(config).is_err());
    }

    #[test]
    fn test_fresh_win_matches_reference_values() {
        let model = model();
        let fresh = SkillEstimate::default();
        let (winner, loser) = model.update(&fresh, &fresh, false).unwrap();

        // c = sqrt(2 sigma0^2 + 2 beta^2), v(0, eps/c) ~ 0.834
        assert!((winner.mu - 29.396).abs() < 0.01, "winner mu {}", winner.mu);
        assert!((loser.mu - 20.604).abs() < 0.01, "loser mu {}", loser.mu);
        assert!((winner.sigma - 7.171).abs() < 0.01, "winner sigma {}", winner.sigma);
        assert!((loser.sigma - 7.171).abs() < 0.01, "loser sigma {}", loser.sigma);

        // Symmetric shift
        let gain = winner.mu - fresh.mu;
        let drop = fresh.mu - loser.mu;
        assert!((gain - drop).abs() < 1e-9);
    }

    #[test]
    fn test_draw_between_equals_keeps_means() {
        let model = model();
        let fresh = SkillEstimate::default();
        let (first, second) = model.update(&fresh, &fresh, true).unwrap();

        assert!((first.mu - 25.0).abs() < 1e-9);
        assert!((second.mu - 25.0).abs() < 1e-9);
        assert!((first.sigma - second.sigma).abs() < 1e-12);
        assert!(first.sigma < fresh.sigma);
    }

    #[test]
    fn test_draw_pulls_means_together() {
        let model = model();
        let strong = SkillEstimate::new(30.0, 4.0);
        let weak = SkillEstimate::new(20.0, 4.0);
        let (new_strong, new_weak) = model.update(&strong, &weak, true).unwrap();

        assert!(new_strong.mu < strong.mu);
        assert!(new_weak.mu > weak.mu);
        assert!(new_strong.sigma <= strong.sigma);
        assert!(new_weak.sigma <= weak.sigma);
    }

    #[test]
    fn test_upset_moves_more_than_expected_win() {
        let model = model();
        let strong = SkillEstimate::new(32.0, 3.0);
        let weak = SkillEstimate::new(18.0, 3.0);

        let (expected_winner, _) = model.update(&strong, &weak, false).unwrap();
        let (upset_winner, _) = model.update(&weak, &strong, false).unwrap();

        let expected_gain = expected_winner.mu - strong.mu;
        let upset_gain = upset_winner.mu - weak.mu;
        assert!(expected_gain >= 0.0);
        assert!(upset_gain > expected_gain);
    }

    #[test]
    fn test_uncertain_items_swing_further() {
        let model = model();
        let (settled, _) = model
            .update(&SkillEstimate::new(25.0, 2.0), &SkillEstimate::new(25.0, 2.0), false)
            .unwrap();
        let (fresh, _) = model
            .update(&SkillEstimate::default(), &SkillEstimate::default(), false)
            .unwrap();

        assert!(fresh.mu - 25.0 > settled.mu - 25.0);
    }

    #[test]
    fn test_update_is_deterministic() {
        let model = model();
        let a = SkillEstimate::new(27.3, 5.1);
        let b = SkillEstimate::new(22.8, 6.4);
        let first = model.update(&a, &b, false).unwrap();
        let second = model.update(&a, &b, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_inputs_are_numeric_instability() {
        let model = model();
        let good = SkillEstimate::default();

        for bad in [
            SkillEstimate::new(25.0, 0.0),
            SkillEstimate::new(25.0, -1.0),
            SkillEstimate::new(f64::NAN, 1.0),
            SkillEstimate::new(25.0, f64::INFINITY),
        ] {
            let err = model.update(&good, &bad, false).unwrap_err();
            assert!(matches!(err, ArenaError::NumericInstability { .. }));
        }
    }

    /// Log sink shared with a test subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_invalid_input_is_logged_as_error() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let model = model();
        let result = tracing::subscriber::with_default(subscriber, || {
            model.update(&SkillEstimate::default(), &SkillEstimate::new(25.0, 0.0), false)
        });
        assert!(matches!(result, Err(ArenaError::NumericInstability { .. })));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"), "{}", output);
        assert!(output.contains("Rating update rejected"), "{}", output);
        assert!(output.contains("loser input is not a valid distribution"), "{}", output);
    }

    #[test]
    fn test_check_output_rejects_growth_and_collapse() {
        let before = SkillEstimate::new(25.0, 2.0);
        assert!(check_output("winner", &before, &SkillEstimate::new(26.0, 1.9)).is_ok());
        assert!(check_output("winner", &before, &SkillEstimate::new(26.0, 2.5)).is_err());
        assert!(check_output("winner", &before, &SkillEstimate::new(26.0, 0.0)).is_err());
        assert!(check_output("winner", &before, &SkillEstimate::new(f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn test_lopsided_outcomes_stay_valid() {
        let model = model();

        // Already far ahead: the expected win barely moves anything
        let top = SkillEstimate::new(200.0, 0.5);
        let bottom = SkillEstimate::new(0.0, 0.5);
        let (new_top, new_bottom) = model.update(&top, &bottom, false).unwrap();
        assert!((new_top.mu - top.mu).abs() < 1e-6);
        assert!((new_bottom.mu - bottom.mu).abs() < 1e-6);
        assert!(new_top.sigma > 0.0 && new_top.sigma <= top.sigma);

        // Extreme upset: large but finite correction
        let underdog = SkillEstimate::new(0.0, 8.0);
        let favourite = SkillEstimate::new(500.0, 8.0);
        let (new_underdog, new_favourite) = model.update(&underdog, &favourite, false).unwrap();
        assert!(new_underdog.mu > underdog.mu);
        assert!(new_favourite.mu < favourite.mu);
        assert!(new_underdog.sigma > 0.0 && new_underdog.sigma <= underdog.sigma);
        assert!(new_favourite.sigma > 0.0 && new_favourite.sigma <= favourite.sigma);
    }

    #[test]
    fn test_expected_score() {
        let model = model();
        let strong = SkillEstimate::new(35.0, 2.0);
        let weak = SkillEstimate::new(15.0, 2.0);
        let equal = SkillEstimate::new(25.0, 2.0);

        let (p_strong, p_weak) = model.expected_score(&strong, &weak);
        assert!(p_strong > 0.9);
        assert!((p_strong + p_weak - 1.0).abs() < 1e-9);

        let (p_a, p_b) = model.expected_score(&equal, &equal);
        assert!((p_a - 0.5).abs() < 1e-9);
        assert!((p_b - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_match_quality_prefers_close_pairs() {
        let model = model();
        let a = SkillEstimate::new(25.0, 3.0);
        let close = SkillEstimate::new(26.0, 3.0);
        let far = SkillEstimate::new(40.0, 3.0);

        let close_quality = model.match_quality(&a, &close);
        let far_quality = model.match_quality(&a, &far);
        assert!(close_quality > far_quality);
        assert!(close_quality <= 1.0);
        assert!(far_quality >= 0.0);
    }

    proptest! {
        #[test]
        fn prop_win_moves_means_apart_and_shrinks_sigma(
            winner_mu in -200.0f64..200.0,
            winner_sigma in 1e-3f64..20.0,
            loser_mu in -200.0f64..200.0,
            loser_sigma in 1e-3f64..20.0,
        ) {
            let model = model();
            let winner = SkillEstimate::new(winner_mu, winner_sigma);
            let loser = SkillEstimate::new(loser_mu, loser_sigma);
            let (new_winner, new_loser) = model.update(&winner, &loser, false).unwrap();

            prop_assert!(new_winner.mu >= winner.mu);
            prop_assert!(new_loser.mu <= loser.mu);
            prop_assert!(new_winner.sigma <= winner.sigma * (1.0 + 1e-9));
            prop_assert!(new_loser.sigma <= loser.sigma * (1.0 + 1e-9));
            prop_assert!(new_winner.sigma > 0.0);
            prop_assert!(new_loser.sigma > 0.0);
            prop_assert!(new_winner.mu.is_finite() && new_loser.mu.is_finite());
        }

        #[test]
        fn prop_draw_never_widens(
            a_mu in 0.0f64..50.0,
            a_sigma in 0.5f64..8.4,
            b_mu in 0.0f64..50.0,
            b_sigma in 0.5f64..8.4,
        ) {
            let model = model();
            let a = SkillEstimate::new(a_mu, a_sigma);
            let b = SkillEstimate::new(b_mu, b_sigma);
            let (new_a, new_b) = model.update(&a, &b, true).unwrap();

            prop_assert!(new_a.sigma <= a.sigma * (1.0 + 1e-9));
            prop_assert!(new_b.sigma <= b.sigma * (1.0 + 1e-9));
            prop_assert!(new_a.sigma > 0.0 && new_b.sigma > 0.0);
        }
    }
}
