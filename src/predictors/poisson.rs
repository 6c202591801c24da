use super::{Predictor, ScoreLine};
use crate::models::Match;

/// Number of goal bins considered per side. Poisson mass beyond this bound
/// is negligible for realistic goal expectations.
pub const GOAL_BINS: usize = 8;

/// Region of the score matrix a computation is restricted to. Masking
/// zeroes the other entries without renormalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMask {
    All,
    Draws,
    HomeWins,
    RoadWins,
}

/// Score probabilities for one match, modelling each side's goal count as
/// an independent Poisson variable with the given expectation.
///
/// The joint matrix is indexed as `[home_goals][road_goals]`, so the lower
/// left triangle holds the home wins and the upper right the road wins.
#[derive(Debug, Clone)]
pub struct PoissonModel {
    lambda_home: f64,
    lambda_road: f64,
}

impl PoissonModel {
    pub fn new(lambda_home: f64, lambda_road: f64) -> Self {
        Self {
            lambda_home,
            lambda_road,
        }
    }

    /// Truncated Poisson probability mass function over 0..GOAL_BINS.
    fn pmf(lambda: f64) -> [f64; GOAL_BINS] {
        let mut pmf = [0.0; GOAL_BINS];
        let mut mass = (-lambda).exp();
        for (goals, slot) in pmf.iter_mut().enumerate() {
            if goals > 0 {
                mass *= lambda / goals as f64;
            }
            *slot = mass;
        }
        pmf
    }

    /// The joint score probability matrix, restricted to `mask`.
    pub fn score_probabilities(&self, mask: ScoreMask) -> [[f64; GOAL_BINS]; GOAL_BINS] {
        let home = Self::pmf(self.lambda_home);
        let road = Self::pmf(self.lambda_road);

        let mut probs = [[0.0; GOAL_BINS]; GOAL_BINS];
        for (i, row) in probs.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                let keep = match mask {
                    ScoreMask::All => true,
                    ScoreMask::Draws => i == j,
                    ScoreMask::HomeWins => i > j,
                    ScoreMask::RoadWins => i < j,
                };
                if keep {
                    *entry = home[i] * road[j];
                }
            }
        }
        probs
    }

    fn mass(&self, mask: ScoreMask) -> f64 {
        self.score_probabilities(mask).iter().flatten().sum()
    }

    /// Aggregate probabilities (home win, road win, draw). Their sum is 1
    /// up to the truncation error.
    pub fn tendency_probabilities(&self) -> (f64, f64, f64) {
        (
            self.mass(ScoreMask::HomeWins),
            self.mass(ScoreMask::RoadWins),
            self.mass(ScoreMask::Draws),
        )
    }

    /// Probability that the goal difference (home minus road) equals `d`.
    pub fn goal_difference_probability(&self, d: i32, mask: ScoreMask) -> f64 {
        let probs = self.score_probabilities(mask);
        let mut total = 0.0;
        for (i, row) in probs.iter().enumerate() {
            for (j, entry) in row.iter().enumerate() {
                if i as i32 - j as i32 == d {
                    total += entry;
                }
            }
        }
        total
    }

    /// The most likely goal difference under `mask`. Differences are
    /// scanned in ascending order, so the smallest one wins a probability
    /// tie.
    pub fn most_likely_goal_difference(&self, mask: ScoreMask) -> (i32, f64) {
        let max_d = GOAL_BINS as i32 - 1;
        let mut best_d = -max_d;
        let mut best_p = f64::NEG_INFINITY;
        for d in -max_d..=max_d {
            let p = self.goal_difference_probability(d, mask);
            if p > best_p {
                best_d = d;
                best_p = p;
            }
        }
        (best_d, best_p)
    }

    /// The most likely exact score, optionally restricted to the goal
    /// difference `d`. The matrix is scanned row-major, so the score with
    /// the fewest home goals wins a probability tie.
    pub fn most_likely_score(&self, d: Option<i32>, mask: ScoreMask) -> (ScoreLine, f64) {
        let probs = self.score_probabilities(mask);
        let mut best_score = (0u8, 0u8);
        let mut best_p = f64::NEG_INFINITY;
        for (i, row) in probs.iter().enumerate() {
            for (j, entry) in row.iter().enumerate() {
                if let Some(d) = d {
                    if i as i32 - j as i32 != d {
                        continue;
                    }
                }
                if *entry > best_p {
                    best_score = (i as u8, j as u8);
                    best_p = *entry;
                }
            }
        }
        (best_score, best_p)
    }

    /// Composite prediction in three stages: the most likely tendency
    /// first, then the most likely goal difference within that tendency,
    /// then the most likely score at that difference. This biases the
    /// result toward the dominant tendency even when a single score
    /// elsewhere in the matrix is marginally more probable.
    pub fn predicted_score(&self) -> (ScoreLine, f64) {
        let (p_home, p_road, p_draw) = self.tendency_probabilities();

        let mask = if p_home >= p_road && p_home >= p_draw {
            ScoreMask::HomeWins
        } else if p_road >= p_draw {
            ScoreMask::RoadWins
        } else {
            ScoreMask::Draws
        };

        let (d, _) = self.most_likely_goal_difference(mask);
        self.most_likely_score(Some(d), mask)
    }
}

/// Adapts the Poisson model to the odds-only predictor contract: the two
/// sides' inverse odds are normalized into a strength share which splits an
/// expected total goal count between them.
#[derive(Debug, Clone)]
pub struct PoissonPredictor {
    /// Expected combined goals of both sides, hand-tuned to a league
    /// average.
    pub mean_total_goals: f64,
}

impl Default for PoissonPredictor {
    fn default() -> Self {
        Self {
            mean_total_goals: 2.8,
        }
    }
}

impl PoissonPredictor {
    fn goal_expectations(&self, m: &Match) -> (f64, f64) {
        let strength_home = 1.0 / m.odds_home;
        let strength_road = 1.0 / m.odds_road;
        let share = strength_home / (strength_home + strength_road);
        (
            self.mean_total_goals * share,
            self.mean_total_goals * (1.0 - share),
        )
    }
}

impl Predictor for PoissonPredictor {
    fn predict(&self, m: &Match) -> ScoreLine {
        let (lambda_home, lambda_road) = self.goal_expectations(m);
        PoissonModel::new(lambda_home, lambda_road).predicted_score().0
    }
}
