use super::{Predictor, ScoreLine};
use crate::models::Match;

/// Smoothed ratio heuristic: the total goal count grows linearly with the
/// odds gap (capped at `max_goals`), and a sub-linear transform of the
/// relative odds skew splits it between winner and loser.
#[derive(Debug, Clone)]
pub struct CalculationPredictor {
    /// Cap on the total number of predicted goals.
    pub max_goals: f64,
    /// Odds gap at which the total goal count reaches the cap.
    pub domination_threshold: f64,
    /// Odds gap below which the match is predicted as a draw.
    pub draw_threshold: f64,
    /// Exponent < 1 flattening the winner/loser goal split.
    pub nonlinearity: f64,
}

impl Default for CalculationPredictor {
    fn default() -> Self {
        Self {
            max_goals: 5.0,
            domination_threshold: 9.0,
            draw_threshold: 1.3,
            nonlinearity: 0.5,
        }
    }
}

impl Predictor for CalculationPredictor {
    fn predict(&self, m: &Match) -> ScoreLine {
        let difference = (m.odds_home - m.odds_road).abs();

        if difference < self.draw_threshold {
            return (1, 1);
        }

        let total_goals =
            ((difference / self.domination_threshold).min(1.0) * self.max_goals).round();

        let skew = if m.odds_home > m.odds_road {
            m.odds_home / m.odds_road
        } else {
            m.odds_road / m.odds_home
        };
        let ratio = (skew / (m.odds_home + m.odds_road)).powf(self.nonlinearity);

        let mut winner = (total_goals * ratio).round() as u8;
        let loser = (total_goals * (1.0 - ratio)).round() as u8;

        // A favorite was identified, so guarantee a winning margin.
        if winner <= loser {
            winner += 1;
        }

        if m.odds_home > m.odds_road {
            (loser, winner)
        } else {
            (winner, loser)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_odds(odds_home: f64, odds_draw: f64, odds_road: f64) -> Match {
        Match::new(
            "FC Hausen".to_string(),
            "SV Gast".to_string(),
            None,
            odds_home,
            odds_draw,
            odds_road,
        )
        .unwrap()
    }

    #[test]
    fn test_equal_odds_is_a_draw() {
        let predictor = CalculationPredictor::default();
        assert_eq!(predictor.predict(&with_odds(2.8, 3.1, 2.8)), (1, 1));
    }

    #[test]
    fn test_gap_below_draw_threshold_is_a_draw() {
        let predictor = CalculationPredictor::default();
        assert_eq!(predictor.predict(&with_odds(2.0, 3.3, 3.2)), (1, 1));
    }

    #[test]
    fn test_clear_home_favorite() {
        let predictor = CalculationPredictor::default();
        // gap 6.8 of 9.0: 4 total goals, split ~0.85/0.15
        assert_eq!(predictor.predict(&with_odds(1.2, 6.5, 8.0)), (3, 1));
    }

    #[test]
    fn test_clear_road_favorite_reverses_the_score() {
        let predictor = CalculationPredictor::default();
        assert_eq!(predictor.predict(&with_odds(8.0, 6.5, 1.2)), (1, 3));
    }

    #[test]
    fn test_narrow_favorite_wins_by_one() {
        let predictor = CalculationPredictor::default();
        // gap 1.4 rounds to a single predicted goal for the favorite
        assert_eq!(predictor.predict(&with_odds(2.9, 3.4, 1.5)), (0, 1));
    }

    #[test]
    fn test_total_goals_are_capped() {
        let predictor = CalculationPredictor::default();
        // gap far beyond the domination threshold still yields at most
        // max_goals in total
        let (home, road) = predictor.predict(&with_odds(1.05, 15.0, 21.0));
        assert!(u32::from(home) + u32::from(road) <= 6);
        assert!(home > road);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let predictor = CalculationPredictor::default();
        let m = with_odds(1.4, 4.5, 7.5);
        assert_eq!(predictor.predict(&m), predictor.predict(&m));
    }
}
