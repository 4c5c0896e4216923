//! Recurring dose schedules.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// How often a schedule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Custom,
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "custom" => Ok(Self::Custom),
            other => Err(ValidationError::InvalidFrequency {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Parse a `"HH:MM"` time-of-day string.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, chrono::format::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M")
}

/// Format a time of day as `"HH:MM"`.
pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// A recurrence rule for one medication.
///
/// `days_of_week` (0=Mon .. 6=Sun) is an *eligibility* filter: the due-reminder
/// poller refuses to fire on excluded weekdays, but timeline expansion via
/// [`crate::engine::expand`] always emits every day in range. Weekly schedules
/// must restrict to at least one weekday; daily/custom schedules may carry a
/// restriction or leave the list empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub medication_id: String,
    /// Times of day the dose should be taken, serialized as `"HH:MM"`.
    #[serde(with = "hhmm_list")]
    pub times: Vec<NaiveTime>,
    pub frequency: Frequency,
    /// 0=Mon .. 6=Sun.
    pub days_of_week: Vec<u8>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Create a daily schedule with a fresh id.
    pub fn new(medication_id: impl Into<String>, times: Vec<NaiveTime>, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            medication_id: medication_id.into(),
            times,
            frequency: Frequency::Daily,
            days_of_week: Vec::new(),
            start_date,
            end_date: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Check structural soundness before the schedule is stored or expanded.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.medication_id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "medication_id",
            });
        }

        if self.times.is_empty() {
            return Err(ValidationError::EmptyTimes);
        }
        let mut seen = HashSet::new();
        for t in &self.times {
            if !seen.insert(*t) {
                return Err(ValidationError::DuplicateTime { time: *t });
            }
        }

        if let Some(end) = self.end_date {
            if self.start_date > end {
                return Err(ValidationError::DateRange {
                    start: self.start_date,
                    end,
                });
            }
        }

        if self.frequency == Frequency::Weekly && self.days_of_week.is_empty() {
            return Err(ValidationError::MissingWeekdays);
        }
        for &d in &self.days_of_week {
            if d > 6 {
                return Err(ValidationError::InvalidWeekday { day: d });
            }
        }

        Ok(())
    }
}

/// Serde representation for `Vec<NaiveTime>` as an ordered `"HH:MM"` list.
mod hhmm_list {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(times: &[NaiveTime], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(times.iter().map(|t| super::format_hhmm(*t)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| super::parse_hhmm(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
