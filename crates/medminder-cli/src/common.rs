//! Shared argument parsing helpers.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use medminder_core::model::parse_hhmm;

pub type CliError = Box<dyn std::error::Error>;

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}' (expected YYYY-MM-DD)").into())
}

/// Parse a naive local datetime, with or without seconds.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, CliError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("invalid datetime '{s}' (expected YYYY-MM-DDTHH:MM[:SS])").into())
}

/// Parse a comma-separated list of `HH:MM` times.
pub fn parse_times(s: &str) -> Result<Vec<NaiveTime>, CliError> {
    s.split(',')
        .map(str::trim)
        .map(|t| parse_hhmm(t).map_err(|_| format!("invalid time '{t}' (expected HH:MM)").into()))
        .collect()
}

/// Parse a comma-separated list of weekday indices (0=Mon .. 6=Sun).
pub fn parse_weekdays(s: &str) -> Result<Vec<u8>, CliError> {
    s.split(',')
        .map(str::trim)
        .map(|d| {
            d.parse::<u8>()
                .map_err(|_| format!("invalid weekday '{d}' (expected 0=Mon .. 6=Sun)").into())
        })
        .collect()
}
