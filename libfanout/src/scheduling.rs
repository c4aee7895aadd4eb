//! Scheduling and time parsing utilities
//!
//! Turns human-readable input into a [`Schedule`] in the local time zone.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

use crate::types::Schedule;
use crate::{FanoutError, Result};

/// Parse a schedule string into a "later" [`Schedule`]
///
/// Supports:
/// - Relative durations: "1h", "30m", "2d", "1 hour"
/// - Natural language: "tomorrow", "next monday 10am"
/// - Absolute times: "2030-11-20 15:00"
///
/// # Errors
///
/// Returns an error if the input cannot be parsed or lies in the past.
pub fn parse_schedule(input: &str) -> Result<Schedule> {
    let instant = parse_instant(input, Local::now())?;
    Ok(schedule_at(&instant))
}

/// Resolve `input` relative to `now`
pub fn parse_instant<Tz>(input: &str, now: DateTime<Tz>) -> Result<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let input = input.trim();
    if input.is_empty() {
        return Err(FanoutError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    let instant = match parse_duration(input) {
        Ok(duration) => now.clone() + duration,
        Err(_) => parse_natural_language(input, now.clone())?,
    };

    if instant <= now {
        return Err(FanoutError::InvalidInput(format!(
            "Schedule '{}' is in the past",
            input
        )));
    }
    Ok(instant)
}

/// Split an instant into the date and `HH:MM` time a draft stores
pub fn schedule_at<Tz: TimeZone>(instant: &DateTime<Tz>) -> Schedule
where
    Tz::Offset: std::fmt::Display,
{
    Schedule::later(instant.date_naive(), instant.format("%H:%M").to_string())
}

/// Parse a calendar date given as `YYYY-MM-DD`
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| {
        FanoutError::InvalidInput(format!(
            "Invalid date '{}': {} (expected YYYY-MM-DD)",
            input, e
        ))
    })
}

fn parse_duration(input: &str) -> Result<Duration> {
    let std_duration = humantime::parse_duration(input)
        .map_err(|e| FanoutError::InvalidInput(format!("Could not parse duration: {}", e)))?;
    Duration::from_std(std_duration)
        .map_err(|_| FanoutError::InvalidInput("Duration out of range".to_string()))
}

fn parse_natural_language<Tz>(input: &str, now: DateTime<Tz>) -> Result<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    chrono_english::parse_date_string(input, now, chrono_english::Dialect::Us)
        .map_err(|e| FanoutError::InvalidInput(format!("Could not parse time '{}': {}", input, e)))
}
