//! Intake logs: records that a dose was actually taken.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::now_local;

pub const MAX_NOTES_LEN: usize = 500;

/// One recorded intake. `scheduled_time` links the log back to an expanded
/// dose timestamp; `None` marks a manual/unplanned log. Taken-matching is
/// exact equality on `scheduled_time`, so the value stored here must be the
/// expanded dose timestamp verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeLog {
    pub id: String,
    pub medication_id: String,
    pub scheduled_time: Option<NaiveDateTime>,
    pub taken_time: NaiveDateTime,
    pub amount_taken: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IntakeLog {
    /// Create a manual log taken right now.
    pub fn new(medication_id: impl Into<String>, amount_taken: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            medication_id: medication_id.into(),
            scheduled_time: None,
            taken_time: now_local(),
            amount_taken,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.medication_id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "medication_id",
            });
        }

        let now = now_local();
        if let Some(scheduled) = self.scheduled_time {
            if scheduled > now {
                return Err(ValidationError::FutureTimestamp {
                    field: "scheduled_time",
                });
            }
            if self.taken_time < scheduled {
                return Err(ValidationError::TakenBeforeScheduled {
                    scheduled,
                    taken: self.taken_time,
                });
            }
        }
        if self.taken_time > now {
            return Err(ValidationError::FutureTimestamp { field: "taken_time" });
        }

        if self.amount_taken < 0.0 {
            return Err(ValidationError::NegativeAmount {
                amount: self.amount_taken,
            });
        }

        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(ValidationError::TooLong {
                    field: "notes",
                    len: notes.chars().count(),
                    max: MAX_NOTES_LEN,
                });
            }
        }

        if self.created_at > Utc::now() {
            return Err(ValidationError::FutureTimestamp { field: "created_at" });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn valid_log_passes() {
        IntakeLog::new("med-1", 1.0).validate().unwrap();
    }

    #[test]
    fn future_taken_time_rejected() {
        let mut log = IntakeLog::new("med-1", 1.0);
        log.taken_time = now_local() + Duration::hours(1);
        assert!(matches!(
            log.validate(),
            Err(ValidationError::FutureTimestamp { field: "taken_time" })
        ));
    }

    #[test]
    fn future_scheduled_time_rejected() {
        let mut log = IntakeLog::new("med-1", 1.0);
        log.scheduled_time = Some(now_local() + Duration::hours(1));
        assert!(matches!(
            log.validate(),
            Err(ValidationError::FutureTimestamp {
                field: "scheduled_time"
            })
        ));
    }

    #[test]
    fn taken_before_scheduled_rejected() {
        let mut log = IntakeLog::new("med-1", 1.0);
        let scheduled = now_local() - Duration::hours(1);
        log.scheduled_time = Some(scheduled);
        log.taken_time = scheduled - Duration::minutes(5);
        assert!(matches!(
            log.validate(),
            Err(ValidationError::TakenBeforeScheduled { .. })
        ));
    }

    #[test]
    fn negative_amount_rejected() {
        let mut log = IntakeLog::new("med-1", 1.0);
        log.amount_taken = -0.5;
        assert!(matches!(
            log.validate(),
            Err(ValidationError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn oversized_notes_rejected() {
        let mut log = IntakeLog::new("med-1", 1.0);
        log.notes = Some("x".repeat(MAX_NOTES_LEN + 1));
        assert!(matches!(
            log.validate(),
            Err(ValidationError::TooLong { field: "notes", .. })
        ));
    }
}
