//! Derived reminder events.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One instance of "this dose, at this time, needs/needed attention".
///
/// Never persisted: the generator recomputes events from current storage and
/// the current wall clock on every call, so `is_taken`/`is_overdue` are
/// always fresh. Invariant: `is_overdue == (schedule_time < now && !is_taken)`
/// evaluated at generation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub medication_id: String,
    pub schedule_id: String,
    /// The expanded dose timestamp.
    pub schedule_time: NaiveDateTime,
    /// `schedule_time` minus the reminder's offset.
    pub reminder_time: NaiveDateTime,
    pub is_taken: bool,
    pub is_overdue: bool,
}

impl ReminderEvent {
    /// Whether the event is inside its attention window at `now`: the
    /// reminder has fired but the dose moment has not yet passed.
    pub fn is_due_at(&self, now: NaiveDateTime) -> bool {
        self.reminder_time <= now && now <= self.schedule_time && !self.is_taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn event(taken: bool) -> ReminderEvent {
        let schedule_time = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        ReminderEvent {
            medication_id: "med-1".into(),
            schedule_id: "sched-1".into(),
            schedule_time,
            reminder_time: schedule_time - chrono::Duration::minutes(30),
            is_taken: taken,
            is_overdue: false,
        }
    }

    #[test]
    fn due_inside_window_only() {
        let e = event(false);
        assert!(!e.is_due_at(e.reminder_time - chrono::Duration::minutes(1)));
        assert!(e.is_due_at(e.reminder_time));
        assert!(e.is_due_at(e.schedule_time));
        assert!(!e.is_due_at(e.schedule_time + chrono::Duration::minutes(1)));
    }

    #[test]
    fn taken_event_never_due() {
        let e = event(true);
        assert!(!e.is_due_at(e.reminder_time));
    }
}
