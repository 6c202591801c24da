pub mod calculation;
pub mod poisson;
pub mod simple;

pub use calculation::CalculationPredictor;
pub use poisson::{PoissonModel, PoissonPredictor, ScoreMask, GOAL_BINS};
pub use simple::SimplePredictor;

use crate::models::Match;
use thiserror::Error;

/// A predicted final score as (home goals, road goals).
pub type ScoreLine = (u8, u8);

#[derive(Debug, Error, PartialEq)]
#[error("unknown predictor: {0}")]
pub struct UnknownPredictor(pub String);

/// Turns a match's three-way odds into a predicted final score.
///
/// Implementations are pure functions of the odds: the same match yields
/// the same score on every call.
pub trait Predictor: std::fmt::Debug {
    fn predict(&self, m: &Match) -> ScoreLine;
}

fn make_simple() -> Box<dyn Predictor> {
    Box::new(SimplePredictor::default())
}

fn make_calculation() -> Box<dyn Predictor> {
    Box::new(CalculationPredictor::default())
}

fn make_poisson() -> Box<dyn Predictor> {
    Box::new(PoissonPredictor::default())
}

/// Registry of the predictors selectable by name. Built once at startup and
/// handed to whoever performs the selection; there is no process-global
/// lookup.
pub struct PredictorRegistry {
    entries: Vec<(&'static str, fn() -> Box<dyn Predictor>)>,
}

impl PredictorRegistry {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("SimplePredictor", make_simple),
                ("CalculationPredictor", make_calculation),
                ("PoissonPredictor", make_poisson),
            ],
        }
    }

    /// The predictor used when none is requested explicitly.
    pub fn default_name(&self) -> &'static str {
        "SimplePredictor"
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Predictor>, UnknownPredictor> {
        self.entries
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, constructor)| constructor())
            .ok_or_else(|| UnknownPredictor(name.to_string()))
    }
}

impl Default for PredictorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
