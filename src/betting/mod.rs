use crate::models::Match;
use crate::predictors::Predictor;
use crate::scrapers::kicktipp::KicktippClient;
use crate::utils::deadline::{format_timedelta, is_before_deadline, parse_duration};
use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use std::fmt;
use tracing::warn;

/// A writable tip input on the bet form: the form field name and the
/// currently submitted value, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TipField {
    pub name: String,
    pub value: Option<String>,
}

/// One row of a community's bet form. The tip fields are absent when the
/// fixture is not open for betting.
#[derive(Debug, Clone)]
pub struct MatchRow {
    pub home_field: Option<TipField>,
    pub road_field: Option<TipField>,
    pub fixture: Match,
}

/// Why a match was passed over instead of betting on it.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The form offers no writable tip inputs for this fixture.
    FieldsUnavailable,
    /// A tip was already submitted and overriding was not requested.
    AlreadyPlaced {
        home: Option<String>,
        road: Option<String>,
    },
    /// The kickoff is not within the configured deadline window.
    /// `remaining` is `None` when the row never resolved a kickoff time.
    OutsideDeadline { remaining: Option<Duration> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BetAction {
    Bet { home: u8, road: u8 },
    Skip(SkipReason),
}

/// Final decision for one match. Created fresh per run, printed exactly
/// once and applied by the batch submitter.
#[derive(Debug, Clone)]
pub struct PredictionDecision {
    pub fixture: Match,
    pub action: BetAction,
}

impl fmt::Display for PredictionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            BetAction::Bet { home, road } => {
                write!(f, "{} - betting {}:{}", self.fixture, home, road)
            }
            BetAction::Skip(SkipReason::FieldsUnavailable) => {
                write!(f, "{} - no bets possible", self.fixture)
            }
            BetAction::Skip(SkipReason::AlreadyPlaced { home, road }) => write!(
                f,
                "{} - skipped, already placed {}:{}",
                self.fixture,
                home.as_deref().unwrap_or(""),
                road.as_deref().unwrap_or("")
            ),
            BetAction::Skip(SkipReason::OutsideDeadline { remaining }) => match remaining {
                Some(remaining) => write!(
                    f,
                    "{} - not betting yet, due in {}",
                    self.fixture,
                    format_timedelta(*remaining)
                ),
                None => write!(f, "{} - not betting, kickoff unknown", self.fixture),
            },
        }
    }
}

/// Classify every row of a community listing into a bet-or-skip decision.
///
/// This is the side-effect-free part of bet placement: one decision per
/// row, in listing order. `now` is explicit so deadline windows are
/// testable.
pub fn classify_matches(
    rows: &[MatchRow],
    predictor: &dyn Predictor,
    override_bets: bool,
    deadline: Option<&str>,
    now: NaiveDateTime,
) -> Result<Vec<PredictionDecision>> {
    // Reject a malformed deadline before any decision is made.
    if let Some(text) = deadline {
        parse_duration(text)?;
    }

    let mut decisions = Vec::with_capacity(rows.len());
    for row in rows {
        decisions.push(PredictionDecision {
            fixture: row.fixture.clone(),
            action: classify_row(row, predictor, override_bets, deadline, now)?,
        });
    }
    Ok(decisions)
}

fn classify_row(
    row: &MatchRow,
    predictor: &dyn Predictor,
    override_bets: bool,
    deadline: Option<&str>,
    now: NaiveDateTime,
) -> Result<BetAction> {
    let (home_field, road_field) = match (&row.home_field, &row.road_field) {
        (Some(home), Some(road)) => (home, road),
        _ => return Ok(BetAction::Skip(SkipReason::FieldsUnavailable)),
    };

    if !override_bets && (home_field.value.is_some() || road_field.value.is_some()) {
        return Ok(BetAction::Skip(SkipReason::AlreadyPlaced {
            home: home_field.value.clone(),
            road: road_field.value.clone(),
        }));
    }

    if let Some(text) = deadline {
        match row.fixture.kickoff {
            Some(kickoff) => {
                if !is_before_deadline(text, kickoff, now)? {
                    return Ok(BetAction::Skip(SkipReason::OutsideDeadline {
                        remaining: Some(kickoff - now),
                    }));
                }
            }
            // A row that never resolved a kickoff cannot be proven due.
            None => {
                return Ok(BetAction::Skip(SkipReason::OutsideDeadline {
                    remaining: None,
                }))
            }
        }
    }

    let (home, road) = predictor.predict(&row.fixture);
    Ok(BetAction::Bet { home, road })
}

/// Form field assignments for every Bet decision, in row order.
pub fn bet_assignments(
    rows: &[MatchRow],
    decisions: &[PredictionDecision],
) -> Vec<(String, String)> {
    let mut assignments = Vec::new();
    for (row, decision) in rows.iter().zip(decisions) {
        if let BetAction::Bet { home, road } = &decision.action {
            if let (Some(home_field), Some(road_field)) = (&row.home_field, &row.road_field) {
                assignments.push((home_field.name.clone(), home.to_string()));
                assignments.push((road_field.name.clone(), road.to_string()));
            }
        }
    }
    assignments
}

#[derive(Debug, Clone, Default)]
pub struct BetOptions {
    pub override_bets: bool,
    pub deadline: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStatus {
    Submitted,
    DryRun,
    Failed(String),
}

/// Outcome of one community's betting pass.
#[derive(Debug)]
pub struct CommunityOutcome {
    pub community: String,
    pub decisions: Vec<PredictionDecision>,
    pub submission: SubmissionStatus,
}

/// Place bets on all given communities, one at a time in the given order.
///
/// Failures are isolated per community: a community whose form cannot be
/// fetched or submitted is reported as failed and the remaining ones still
/// run.
pub async fn place_bets(
    client: &KicktippClient,
    communities: &[String],
    predictor: &dyn Predictor,
    options: &BetOptions,
) -> Vec<CommunityOutcome> {
    let mut outcomes = Vec::with_capacity(communities.len());
    for community in communities {
        let outcome = match place_community_bets(client, community, predictor, options).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("betting on {} failed: {:#}", community, err);
                eprintln!("{}: betting failed: {:#}", community, err);
                CommunityOutcome {
                    community: community.clone(),
                    decisions: Vec::new(),
                    submission: SubmissionStatus::Failed(format!("{err:#}")),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

async fn place_community_bets(
    client: &KicktippClient,
    community: &str,
    predictor: &dyn Predictor,
    options: &BetOptions,
) -> Result<CommunityOutcome> {
    let (form, rows) = client
        .fetch_match_rows(community)
        .await
        .with_context(|| format!("Failed to fetch bet form of {}", community))?;

    let now = Local::now().naive_local();
    let decisions = classify_matches(
        &rows,
        predictor,
        options.override_bets,
        options.deadline.as_deref(),
        now,
    )?;

    println!("\n{}", community);
    for decision in &decisions {
        println!("{}", decision);
    }

    let submission = if options.dry_run {
        println!("Dry run, no bets were placed");
        SubmissionStatus::DryRun
    } else {
        let assignments = bet_assignments(&rows, &decisions);
        client
            .submit_tips(&form, &assignments)
            .await
            .with_context(|| format!("Failed to submit bets of {}", community))?;
        println!("Bets submitted for {}", community);
        SubmissionStatus::Submitted
    };

    Ok(CommunityOutcome {
        community: community.to_string(),
        decisions,
        submission,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictors::SimplePredictor;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 9, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fixture(kickoff: Option<NaiveDateTime>) -> Match {
        // clear home favorite, SimplePredictor bets (3, 1)
        Match::new(
            "FC Hausen".to_string(),
            "SV Gast".to_string(),
            kickoff,
            1.2,
            5.0,
            8.0,
        )
        .unwrap()
    }

    fn tip_field(name: &str, value: Option<&str>) -> Option<TipField> {
        Some(TipField {
            name: name.to_string(),
            value: value.map(str::to_string),
        })
    }

    fn open_row(kickoff: Option<NaiveDateTime>) -> MatchRow {
        MatchRow {
            home_field: tip_field("spieltippForms[1].heimTipp", None),
            road_field: tip_field("spieltippForms[1].gastTipp", None),
            fixture: fixture(kickoff),
        }
    }

    #[test]
    fn test_open_row_gets_a_bet() {
        let rows = vec![open_row(Some(noon()))];
        let decisions =
            classify_matches(&rows, &SimplePredictor::default(), false, None, noon()).unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].action, BetAction::Bet { home: 3, road: 1 });
    }

    #[test]
    fn test_missing_fields_skip_regardless_of_everything_else() {
        let mut row = open_row(Some(noon()));
        row.road_field = None;
        let decisions =
            classify_matches(&[row], &SimplePredictor::default(), true, None, noon()).unwrap();
        assert_eq!(
            decisions[0].action,
            BetAction::Skip(SkipReason::FieldsUnavailable)
        );
    }

    #[test]
    fn test_already_placed_without_override() {
        let mut row = open_row(Some(noon()));
        row.home_field = tip_field("spieltippForms[1].heimTipp", Some("2"));
        row.road_field = tip_field("spieltippForms[1].gastTipp", Some("1"));
        let decisions =
            classify_matches(&[row], &SimplePredictor::default(), false, None, noon()).unwrap();
        assert_eq!(
            decisions[0].action,
            BetAction::Skip(SkipReason::AlreadyPlaced {
                home: Some("2".to_string()),
                road: Some("1".to_string()),
            })
        );
    }

    #[test]
    fn test_one_sided_tip_counts_as_already_placed() {
        let mut row = open_row(Some(noon()));
        row.home_field = tip_field("spieltippForms[1].heimTipp", Some("2"));
        let decisions =
            classify_matches(&[row], &SimplePredictor::default(), false, None, noon()).unwrap();
        assert!(matches!(
            decisions[0].action,
            BetAction::Skip(SkipReason::AlreadyPlaced { .. })
        ));
    }

    #[test]
    fn test_override_replaces_a_placed_bet() {
        let mut row = open_row(Some(noon()));
        row.home_field = tip_field("spieltippForms[1].heimTipp", Some("2"));
        row.road_field = tip_field("spieltippForms[1].gastTipp", Some("1"));
        let decisions =
            classify_matches(&[row], &SimplePredictor::default(), true, None, noon()).unwrap();
        assert_eq!(decisions[0].action, BetAction::Bet { home: 3, road: 1 });
    }

    #[test]
    fn test_already_placed_outranks_the_deadline_filter() {
        let now = noon();
        let mut row = open_row(Some(now + Duration::days(3)));
        row.home_field = tip_field("spieltippForms[1].heimTipp", Some("2"));
        let decisions =
            classify_matches(&[row], &SimplePredictor::default(), false, Some("1h"), now).unwrap();
        assert!(matches!(
            decisions[0].action,
            BetAction::Skip(SkipReason::AlreadyPlaced { .. })
        ));
    }

    #[test]
    fn test_deadline_window() {
        let now = noon();
        let due = open_row(Some(now + Duration::minutes(30)));
        let not_due = open_row(Some(now + Duration::days(3)));
        let decisions = classify_matches(
            &[due, not_due],
            &SimplePredictor::default(),
            false,
            Some("1h"),
            now,
        )
        .unwrap();
        assert_eq!(decisions[0].action, BetAction::Bet { home: 3, road: 1 });
        assert_eq!(
            decisions[1].action,
            BetAction::Skip(SkipReason::OutsideDeadline {
                remaining: Some(Duration::days(3)),
            })
        );
    }

    #[test]
    fn test_unresolved_kickoff_with_deadline_filter_skips() {
        let decisions = classify_matches(
            &[open_row(None)],
            &SimplePredictor::default(),
            false,
            Some("1h"),
            noon(),
        )
        .unwrap();
        assert_eq!(
            decisions[0].action,
            BetAction::Skip(SkipReason::OutsideDeadline { remaining: None })
        );
    }

    #[test]
    fn test_no_deadline_filter_bets_on_everything_open() {
        let rows = vec![
            open_row(Some(noon() + Duration::days(30))),
            open_row(None),
        ];
        let decisions =
            classify_matches(&rows, &SimplePredictor::default(), false, None, noon()).unwrap();
        for decision in &decisions {
            assert!(matches!(decision.action, BetAction::Bet { .. }));
        }
    }

    #[test]
    fn test_invalid_deadline_aborts_the_pass() {
        let result = classify_matches(
            &[open_row(Some(noon()))],
            &SimplePredictor::default(),
            false,
            Some("soon"),
            noon(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bet_assignments_cover_only_bet_decisions() {
        let now = noon();
        let open = open_row(Some(now + Duration::minutes(30)));
        let mut closed = open_row(Some(now + Duration::minutes(45)));
        closed.home_field = None;
        closed.road_field = None;
        let rows = vec![open, closed];
        let decisions =
            classify_matches(&rows, &SimplePredictor::default(), false, Some("1h"), now).unwrap();

        let assignments = bet_assignments(&rows, &decisions);
        assert_eq!(
            assignments,
            vec![
                ("spieltippForms[1].heimTipp".to_string(), "3".to_string()),
                ("spieltippForms[1].gastTipp".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_decision_lines_match_the_report_format() {
        let now = noon();
        let decisions = classify_matches(
            &[open_row(Some(now + Duration::minutes(30)))],
            &SimplePredictor::default(),
            false,
            None,
            now,
        )
        .unwrap();
        assert_eq!(
            decisions[0].to_string(),
            "02.09.2023 12:30 'FC Hausen' vs. 'SV Gast'  (1.2;5;8) - betting 3:1"
        );

        let skipped = PredictionDecision {
            fixture: fixture(Some(now)),
            action: BetAction::Skip(SkipReason::OutsideDeadline {
                remaining: Some(Duration::days(2) + Duration::minutes(75)),
            }),
        };
        assert!(skipped
            .to_string()
            .ends_with("- not betting yet, due in 2 days and 01:15"));
    }
}
