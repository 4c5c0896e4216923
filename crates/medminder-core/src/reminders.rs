//! Reminder event generation and intake matching.
//!
//! Events are derived, never stored: every call walks the current schedules,
//! reminder configs, and intake logs, so taken/overdue state is always fresh.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDateTime};

use crate::engine::expand;
use crate::error::Result;
use crate::model::{now_local, ReminderEvent};
use crate::storage::Database;

/// Derives [`ReminderEvent`]s from stored schedules, reminders, and logs.
pub struct ReminderService<'a> {
    db: &'a Database,
}

impl<'a> ReminderService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Whether a dose at exactly `scheduled_time` was logged as taken.
    ///
    /// Strict equality on the stored `scheduled_time`; there is no tolerance
    /// window. Manual logs (no `scheduled_time`) never match.
    pub fn is_taken(&self, medication_id: &str, scheduled_time: NaiveDateTime) -> Result<bool> {
        let logs = self.db.intake_logs_for_medication(medication_id)?;
        Ok(logs
            .iter()
            .any(|log| log.scheduled_time == Some(scheduled_time)))
    }

    /// Generate every reminder event implied by current storage.
    ///
    /// A schedule with no reminder rows produces nothing; disabled reminders
    /// and inactive schedules are skipped. Each (dose timestamp, enabled
    /// reminder) pair yields exactly one event, so a schedule with N doses and
    /// M enabled reminders yields N×M events. Sorted by dose timestamp.
    pub fn generate_events(&self) -> Result<Vec<ReminderEvent>> {
        self.generate_events_at(now_local())
    }

    pub fn generate_events_at(&self, now: NaiveDateTime) -> Result<Vec<ReminderEvent>> {
        // Taken-matching set per medication, loaded once per scan.
        let mut taken: HashMap<String, HashSet<NaiveDateTime>> = HashMap::new();

        let mut events = Vec::new();
        for schedule in self.db.list_schedules()? {
            if !schedule.is_active {
                continue;
            }
            let reminders: Vec<_> = self
                .db
                .reminders_for_schedule(&schedule.id)?
                .into_iter()
                .filter(|r| r.enabled)
                .collect();
            if reminders.is_empty() {
                continue;
            }

            if !taken.contains_key(&schedule.medication_id) {
                let logs = self.db.intake_logs_for_medication(&schedule.medication_id)?;
                let set = logs.iter().filter_map(|l| l.scheduled_time).collect();
                taken.insert(schedule.medication_id.clone(), set);
            }
            let taken_set = &taken[&schedule.medication_id];

            for schedule_time in expand(&schedule)? {
                let is_taken = taken_set.contains(&schedule_time);
                for reminder in &reminders {
                    events.push(ReminderEvent {
                        medication_id: schedule.medication_id.clone(),
                        schedule_id: schedule.id.clone(),
                        schedule_time,
                        reminder_time: schedule_time - Duration::minutes(reminder.offset_minutes),
                        is_taken,
                        is_overdue: schedule_time < now && !is_taken,
                    });
                }
            }
        }

        events.sort_by(|a, b| {
            a.schedule_time
                .cmp(&b.schedule_time)
                .then_with(|| a.reminder_time.cmp(&b.reminder_time))
        });
        Ok(events)
    }

    /// Untaken events whose reminder has not fired yet.
    pub fn get_upcoming(&self) -> Result<Vec<ReminderEvent>> {
        self.get_upcoming_at(now_local())
    }

    pub fn get_upcoming_at(&self, now: NaiveDateTime) -> Result<Vec<ReminderEvent>> {
        let mut events = self.generate_events_at(now)?;
        events.retain(|e| !e.is_taken && e.reminder_time > now);
        Ok(events)
    }

    /// Events currently inside their attention window: the reminder has fired
    /// but the dose moment has not passed, and the dose is not taken.
    pub fn get_due(&self) -> Result<Vec<ReminderEvent>> {
        self.get_due_at(now_local())
    }

    pub fn get_due_at(&self, now: NaiveDateTime) -> Result<Vec<ReminderEvent>> {
        let mut events = self.generate_events_at(now)?;
        events.retain(|e| e.is_due_at(now));
        Ok(events)
    }

    /// Events whose dose moment has passed untaken.
    pub fn get_overdue(&self) -> Result<Vec<ReminderEvent>> {
        self.get_overdue_at(now_local())
    }

    pub fn get_overdue_at(&self, now: NaiveDateTime) -> Result<Vec<ReminderEvent>> {
        let mut events = self.generate_events_at(now)?;
        events.retain(|e| e.is_overdue);
        Ok(events)
    }

    /// The upcoming event for one medication with the earliest reminder
    /// time, if any.
    pub fn get_next_for_medication(&self, medication_id: &str) -> Result<Option<ReminderEvent>> {
        self.get_next_for_medication_at(medication_id, now_local())
    }

    pub fn get_next_for_medication_at(
        &self,
        medication_id: &str,
        now: NaiveDateTime,
    ) -> Result<Option<ReminderEvent>> {
        let events = self.get_upcoming_at(now)?;
        Ok(events
            .into_iter()
            .filter(|e| e.medication_id == medication_id)
            .min_by_key(|e| e.reminder_time))
    }
}
