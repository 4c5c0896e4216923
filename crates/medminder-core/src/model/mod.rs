//! Domain types: medications, schedules, reminders, intake logs, and the
//! derived reminder events.
//!
//! Each persisted type carries its own `validate()`; repositories call it
//! before every write and again after reads, so malformed rows surface as
//! [`crate::ValidationError`] instead of flowing into the scheduling core.

mod event;
mod intake;
mod medication;
mod reminder;
mod schedule;

pub use event::ReminderEvent;
pub use intake::IntakeLog;
pub use medication::Medication;
pub use reminder::Reminder;
pub use schedule::{format_hhmm, parse_hhmm, Frequency, Schedule};

use chrono::{Local, NaiveDateTime};

/// Current wall-clock time as a naive local datetime.
///
/// Dose timestamps are naive local throughout: schedules describe "08:00 on
/// this date" in the user's own clock, and intake matching is exact equality
/// on those values.
pub(crate) fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}
