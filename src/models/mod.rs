use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kickoff timestamps as they appear on the bet form, e.g. "02.09.23 15:30"
pub const KICKOFF_FORMAT: &str = "%d.%m.%y %H:%M";

#[derive(Debug, Error, PartialEq)]
pub enum InvalidMatch {
    #[error("team name must not be empty")]
    EmptyTeamName,
    #[error("odds must be strictly positive, got {0}")]
    NonPositiveOdds(f64),
}

/// One fixture on a community's bet form: team names, kickoff time and the
/// bookmaker's three-way odds (home win, draw, road win). Lower odds mean
/// a more likely outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub home_team: String,
    pub road_team: String,
    /// Absent when the source row omitted the date cell and no earlier row
    /// in the listing could supply it.
    pub kickoff: Option<NaiveDateTime>,
    pub odds_home: f64,
    pub odds_draw: f64,
    pub odds_road: f64,
}

impl Match {
    pub fn new(
        home_team: String,
        road_team: String,
        kickoff: Option<NaiveDateTime>,
        odds_home: f64,
        odds_draw: f64,
        odds_road: f64,
    ) -> Result<Self, InvalidMatch> {
        if home_team.trim().is_empty() || road_team.trim().is_empty() {
            return Err(InvalidMatch::EmptyTeamName);
        }
        for odds in [odds_home, odds_draw, odds_road] {
            if odds <= 0.0 {
                return Err(InvalidMatch::NonPositiveOdds(odds));
            }
        }
        Ok(Self {
            home_team,
            road_team,
            kickoff,
            odds_home,
            odds_draw,
            odds_road,
        })
    }

    pub fn odds(&self) -> (f64, f64, f64) {
        (self.odds_home, self.odds_draw, self.odds_road)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kickoff {
            Some(kickoff) => write!(f, "{}", kickoff.format("%d.%m.%Y %H:%M"))?,
            None => f.write_str("--.--.---- --:--")?,
        }
        write!(
            f,
            " '{}' vs. '{}'  ({};{};{})",
            self.home_team, self.road_team, self.odds_home, self.odds_draw, self.odds_road
        )
    }
}
