//! Due-reminder polling.
//!
//! [`due_reminders_at`] is the single scan: which reminders should fire at
//! this minute. [`DuePoller`] runs that scan on a tokio interval in the
//! background and forwards hits to an injected sink. The poller opens its own
//! database connection inside the task; connections are never shared across
//! execution contexts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDateTime};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::Result;
use crate::model::{now_local, Medication, Reminder};
use crate::storage::Database;

/// A reminder that should fire right now, with enough context to notify.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub medication: Medication,
    pub reminder: Reminder,
    /// The dose timestamp this firing points at (today's date + time of day).
    pub dose_time: NaiveDateTime,
}

/// Shared on/off switch for notifications.
///
/// The poller holds one handle, the configuration surface another; flipping
/// the flag takes effect on the next tick without restarting the task.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    enabled: Arc<AtomicBool>,
}

impl NotifierConfig {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

fn date_in_window(schedule: &crate::model::Schedule, date: chrono::NaiveDate) -> bool {
    date >= schedule.start_date && schedule.end_date.map_or(true, |end| date <= end)
}

/// Scan all reminders and return the ones due at `now`.
///
/// A reminder fires when `today's dose time − offset` lands on the same
/// minute as `now` (`HH:MM` match, day-granular: only today's instances of
/// the schedule are considered). Gates, in order: the reminder is enabled,
/// its schedule exists and is active, today is inside the schedule's date
/// window, and today's weekday passes the schedule's restriction (an empty
/// restriction passes every day). An inactive medication never fires.
///
/// A missing or corrupt schedule row disqualifies that reminder only; the
/// failure is logged and the scan continues.
pub fn due_reminders_at(db: &Database, now: NaiveDateTime) -> Result<Vec<DueReminder>> {
    let today = now.date();
    let weekday = today.weekday().num_days_from_monday() as u8;
    let minute = now.format("%H:%M").to_string();

    let mut due = Vec::new();
    for reminder in db.list_reminders()? {
        if !reminder.enabled {
            continue;
        }

        let schedule = match db.get_schedule(&reminder.schedule_id) {
            Ok(s) => s,
            Err(err) => {
                warn!(
                    reminder_id = %reminder.id,
                    schedule_id = %reminder.schedule_id,
                    %err,
                    "skipping reminder: schedule unusable"
                );
                continue;
            }
        };
        if !schedule.is_active || !date_in_window(&schedule, today) {
            continue;
        }
        if !schedule.days_of_week.is_empty() && !schedule.days_of_week.contains(&weekday) {
            continue;
        }

        for &time in &schedule.times {
            let dose_time = today.and_time(time);
            let fire_time = dose_time - Duration::minutes(reminder.offset_minutes);
            if fire_time.format("%H:%M").to_string() != minute {
                continue;
            }
            match db.get_medication(&reminder.medication_id) {
                Ok(medication) if medication.is_active => {
                    due.push(DueReminder {
                        medication,
                        reminder: reminder.clone(),
                        dose_time,
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        reminder_id = %reminder.id,
                        medication_id = %reminder.medication_id,
                        %err,
                        "skipping reminder: medication unusable"
                    );
                }
            }
        }
    }
    Ok(due)
}

type Sink = Arc<dyn Fn(&DueReminder) + Send + Sync>;

/// Background task that runs the due scan on a fixed interval.
///
/// Lifecycle is idle -> running -> idle: [`DuePoller::start`] is a no-op
/// while a task is already running, [`DuePoller::stop`] signals the task and
/// waits for it to finish.
pub struct DuePoller {
    db_path: PathBuf,
    interval: std::time::Duration,
    notifier: NotifierConfig,
    sink: Sink,
    running: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

impl DuePoller {
    pub fn new(
        db_path: PathBuf,
        interval: std::time::Duration,
        notifier: NotifierConfig,
        sink: Sink,
    ) -> Self {
        Self {
            db_path,
            interval,
            notifier,
            sink,
            running: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Start the background task. Returns `false` (and does nothing) when a
    /// task is already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return false;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let db_path = self.db_path.clone();
        let interval = self.interval;
        let notifier = self.notifier.clone();
        let sink = Arc::clone(&self.sink);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if !notifier.enabled() {
                            continue;
                        }
                        scan_once(&db_path, &sink);
                    }
                }
            }
        });

        *running = Some((stop_tx, handle));
        true
    }

    /// Stop the background task and wait for it to exit. No-op when idle.
    pub async fn stop(&self) {
        let entry = self.running.lock().await.take();
        if let Some((stop_tx, handle)) = entry {
            let _ = stop_tx.send(true);
            let _ = handle.await;
        }
    }
}

/// One tick: open a fresh connection, scan, forward. Failures are logged;
/// the next tick starts clean.
fn scan_once(db_path: &std::path::Path, sink: &Sink) {
    let db = match Database::open_at(db_path) {
        Ok(db) => db,
        Err(err) => {
            warn!(%err, "poller tick: could not open database");
            return;
        }
    };
    match due_reminders_at(&db, now_local()) {
        Ok(due) => {
            for item in &due {
                (sink)(item);
            }
        }
        Err(err) => warn!(%err, "poller tick: due scan failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_hhmm, Schedule};
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, hhmm: &str) -> NaiveDateTime {
        date(y, m, d).and_time(parse_hhmm(hhmm).unwrap())
    }

    struct Fixture {
        db: Database,
        med: Medication,
        schedule: Schedule,
        reminder: Reminder,
    }

    // 2021-06-02 is a Wednesday (weekday index 2).
    fn fixture() -> Fixture {
        let db = Database::open_memory().unwrap();
        let med = Medication::new("Aspirin", "100mg");
        db.create_medication(&med).unwrap();

        let mut schedule = Schedule::new(&med.id, vec![parse_hhmm("08:00").unwrap()], date(2021, 6, 1));
        schedule.end_date = Some(date(2021, 6, 30));
        db.create_schedule(&schedule).unwrap();

        let reminder = Reminder::new(&med.id, &schedule.id, 30);
        db.create_reminder(&reminder).unwrap();

        Fixture {
            db,
            med,
            schedule,
            reminder,
        }
    }

    #[test]
    fn fires_on_the_matching_minute_only() {
        let f = fixture();
        let due = due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].reminder.id, f.reminder.id);
        assert_eq!(due[0].dose_time, at(2021, 6, 2, "08:00"));
        assert_eq!(due[0].medication.name, "Aspirin");

        assert!(due_reminders_at(&f.db, at(2021, 6, 2, "07:29")).unwrap().is_empty());
        assert!(due_reminders_at(&f.db, at(2021, 6, 2, "07:31")).unwrap().is_empty());
    }

    #[test]
    fn disabled_reminder_never_fires() {
        let f = fixture();
        let mut reminder = f.reminder.clone();
        reminder.enabled = false;
        f.db.update_reminder(&reminder).unwrap();
        assert!(due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap().is_empty());
    }

    #[test]
    fn inactive_schedule_never_fires() {
        let f = fixture();
        let mut schedule = f.schedule.clone();
        schedule.is_active = false;
        f.db.update_schedule(&schedule).unwrap();
        assert!(due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap().is_empty());
    }

    #[test]
    fn inactive_medication_never_fires() {
        let f = fixture();
        let mut med = f.med.clone();
        med.is_active = false;
        f.db.update_medication(&med).unwrap();
        assert!(due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap().is_empty());
    }

    #[test]
    fn date_window_gates_firing() {
        let f = fixture();
        assert!(due_reminders_at(&f.db, at(2021, 5, 31, "07:30")).unwrap().is_empty());
        assert!(due_reminders_at(&f.db, at(2021, 7, 1, "07:30")).unwrap().is_empty());
        assert_eq!(due_reminders_at(&f.db, at(2021, 6, 30, "07:30")).unwrap().len(), 1);
    }

    #[test]
    fn weekday_restriction_gates_firing() {
        let f = fixture();
        let mut schedule = f.schedule.clone();
        schedule.days_of_week = vec![0]; // Monday only
        f.db.update_schedule(&schedule).unwrap();
        assert!(due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap().is_empty());

        schedule.days_of_week = vec![2]; // Wednesday
        f.db.update_schedule(&schedule).unwrap();
        assert_eq!(due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap().len(), 1);
    }

    #[test]
    fn zero_offset_fires_at_dose_time() {
        let f = fixture();
        let mut reminder = f.reminder.clone();
        reminder.offset_minutes = 0;
        f.db.update_reminder(&reminder).unwrap();
        let due = due_reminders_at(&f.db, at(2021, 6, 2, "08:00")).unwrap();
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn broken_row_skips_that_reminder_only() {
        let f = fixture();

        // A reminder pointing at a schedule that no longer exists, inserted
        // underneath the foreign-key check.
        f.db.conn()
            .execute_batch(
                "PRAGMA foreign_keys = OFF;
                 INSERT INTO reminders (id, medication_id, schedule_id, enabled, offset_minutes)
                 VALUES ('dangling', 'med-x', 'gone', 1, 30);
                 PRAGMA foreign_keys = ON;",
            )
            .unwrap();

        let due = due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].reminder.id, f.reminder.id);
    }

    #[test]
    fn corrupt_schedule_row_skips_that_reminder_only() {
        let f = fixture();

        let med2 = Medication::new("Ibuprofen", "200mg");
        f.db.create_medication(&med2).unwrap();
        let mut s2 = Schedule::new(&med2.id, vec![parse_hhmm("08:00").unwrap()], date(2021, 6, 1));
        s2.end_date = Some(date(2021, 6, 30));
        f.db.create_schedule(&s2).unwrap();
        f.db.create_reminder(&Reminder::new(&med2.id, &s2.id, 30)).unwrap();

        f.db.conn()
            .execute(
                "UPDATE schedules SET frequency = 'hourly' WHERE id = ?1",
                rusqlite::params![s2.id],
            )
            .unwrap();

        let due = due_reminders_at(&f.db, at(2021, 6, 2, "07:30")).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].reminder.id, f.reminder.id);
    }

    #[test]
    fn notifier_flag_is_shared() {
        let config = NotifierConfig::new(true);
        let handle = config.clone();
        handle.set_enabled(false);
        assert!(!config.enabled());
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("poller.db");
        Database::open_at(&db_path).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_sink = Arc::clone(&fired);
        let poller = DuePoller::new(
            db_path,
            std::time::Duration::from_millis(10),
            NotifierConfig::new(false),
            Arc::new(move |_| {
                fired_in_sink.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(!poller.is_running().await);
        assert!(poller.start().await);
        assert!(poller.is_running().await);
        assert!(!poller.start().await);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        poller.stop().await;
        assert!(!poller.is_running().await);

        // Notifications disabled: ticks ran but nothing was forwarded.
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Restart after stop is allowed.
        assert!(poller.start().await);
        poller.stop().await;
    }
}
