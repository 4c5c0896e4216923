//! Reminder configuration attached to one schedule.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MAX_OFFSET_MINUTES: i64 = 1440;

/// An enable flag plus a lead-time offset: "notify me N minutes before the
/// scheduled dose". Reminders are opt-in per schedule; a schedule without any
/// reminder rows generates no events at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub medication_id: String,
    pub schedule_id: String,
    pub enabled: bool,
    /// Minutes before the scheduled dose that the reminder fires (0..=1440).
    pub offset_minutes: i64,
}

impl Reminder {
    pub fn new(
        medication_id: impl Into<String>,
        schedule_id: impl Into<String>,
        offset_minutes: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            medication_id: medication_id.into(),
            schedule_id: schedule_id.into(),
            enabled: true,
            offset_minutes,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.medication_id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "medication_id",
            });
        }
        if self.schedule_id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "schedule_id",
            });
        }
        if self.offset_minutes < 0 {
            return Err(ValidationError::NegativeOffset {
                minutes: self.offset_minutes,
            });
        }
        if self.offset_minutes > MAX_OFFSET_MINUTES {
            return Err(ValidationError::OffsetTooLarge {
                minutes: self.offset_minutes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_reminder_passes() {
        Reminder::new("med-1", "sched-1", 30).validate().unwrap();
        Reminder::new("med-1", "sched-1", 0).validate().unwrap();
        Reminder::new("med-1", "sched-1", 1440).validate().unwrap();
    }

    #[test]
    fn negative_offset_rejected() {
        let r = Reminder::new("med-1", "sched-1", -1);
        assert!(matches!(
            r.validate(),
            Err(ValidationError::NegativeOffset { minutes: -1 })
        ));
    }

    #[test]
    fn oversized_offset_rejected() {
        let r = Reminder::new("med-1", "sched-1", 1441);
        assert!(matches!(
            r.validate(),
            Err(ValidationError::OffsetTooLarge { minutes: 1441 })
        ));
    }

    #[test]
    fn empty_references_rejected() {
        let r = Reminder::new("", "sched-1", 10);
        assert!(matches!(
            r.validate(),
            Err(ValidationError::EmptyField {
                field: "medication_id"
            })
        ));
        let r = Reminder::new("med-1", "  ", 10);
        assert!(matches!(
            r.validate(),
            Err(ValidationError::EmptyField { field: "schedule_id" })
        ));
    }
}
