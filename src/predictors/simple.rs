use super::{Predictor, ScoreLine};
use crate::models::Match;

/// Threshold heuristic: an odds gap below `draw_threshold` is called a
/// draw, larger gaps map onto one of three graduated scorelines, oriented
/// toward the side with the lower odds.
#[derive(Debug, Clone)]
pub struct SimplePredictor {
    /// Odds gap below which the match is predicted as a draw.
    pub draw_threshold: f64,
    /// Odds gap at which one side counts as dominating; half of it marks
    /// the middle tier.
    pub domination_threshold: f64,
}

impl Default for SimplePredictor {
    fn default() -> Self {
        Self {
            draw_threshold: 1.2,
            domination_threshold: 6.0,
        }
    }
}

impl Predictor for SimplePredictor {
    fn predict(&self, m: &Match) -> ScoreLine {
        let diff = (m.odds_home - m.odds_road).abs();
        let home_wins = m.odds_home < m.odds_road;

        if diff < self.draw_threshold {
            return (1, 1);
        }

        let (winner, loser) = if diff >= self.domination_threshold {
            (3, 1)
        } else if diff >= self.domination_threshold / 2.0 {
            (2, 1)
        } else {
            (1, 0)
        };

        if home_wins {
            (winner, loser)
        } else {
            (loser, winner)
        }
    }
}
