use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// Grammar of the --deadline option: <count><unit>, unit one of m, h, d.
// The count must be a positive integer and nothing may precede or follow.
static DURATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([1-9][0-9]*)([mhd])$").unwrap());

#[derive(Debug, Error, PartialEq)]
#[error("wrong duration string '{0}', use <number><unit> with unit one of m, h, d")]
pub struct InvalidDuration(pub String);

/// Parse a compact duration string like "10m", "5h" or "1d".
pub fn parse_duration(text: &str) -> Result<Duration, InvalidDuration> {
    let caps = DURATION_RE
        .captures(text)
        .ok_or_else(|| InvalidDuration(text.to_string()))?;
    let count: i64 = caps[1]
        .parse()
        .map_err(|_| InvalidDuration(text.to_string()))?;

    let span = match &caps[2] {
        "m" => Duration::minutes(count),
        "h" => Duration::hours(count),
        "d" => Duration::days(count),
        _ => unreachable!(),
    };
    Ok(span)
}

/// Render a time span as "HH:MM", or "<N> day(s) and HH:MM" once it spans
/// whole days. Negative spans are clamped to zero.
pub fn format_timedelta(delta: Duration) -> String {
    let delta = delta.max(Duration::zero());
    let days = delta.num_days();
    let hours = delta.num_hours() - days * 24;
    let minutes = delta.num_minutes() - delta.num_hours() * 60;

    let hm = format!("{:02}:{:02}", hours, minutes);
    if days > 0 {
        format!("{} {} and {}", days, if days > 1 { "days" } else { "day" }, hm)
    } else {
        hm
    }
}

/// True iff `deadline` lies within `duration_text` of `now`. A deadline
/// already in the past is never due.
pub fn is_before_deadline(
    duration_text: &str,
    deadline: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<bool, InvalidDuration> {
    let span = parse_duration(duration_text)?;
    Ok(now <= deadline && deadline - now <= span)
}
