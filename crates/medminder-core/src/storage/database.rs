//! SQLite-based storage for medications, schedules, reminders, and intake logs.
//!
//! One connection per `Database`; concurrent contexts (the due-reminder
//! poller, the interactive foreground) each open their own handle on the same
//! file rather than sharing a connection. Every write validates first and
//! every read re-validates the mapped row, propagating failures instead of
//! patching them over.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, Result};
use crate::model::{format_hhmm, parse_hhmm, Frequency, IntakeLog, Medication, Reminder, Schedule};

// === Helper Functions ===

const NAIVE_DT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a naive local timestamp for storage (seconds precision).
fn format_naive_dt(dt: NaiveDateTime) -> String {
    dt.format(NAIVE_DT_FORMAT).to_string()
}

fn conversion_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_naive_dt(idx: usize, s: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(s, NAIVE_DT_FORMAT).map_err(|e| conversion_err(idx, e))
}

fn parse_date(idx: usize, s: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| conversion_err(idx, e))
}

fn parse_utc_dt(idx: usize, s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

/// Build a Medication from a database row.
fn row_to_medication(row: &rusqlite::Row) -> Result<Medication, rusqlite::Error> {
    let created_at = parse_utc_dt(6, &row.get::<_, String>(6)?)?;
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        dosage: row.get(3)?,
        notes: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
        created_at,
    })
}

/// Build a Schedule from a database row.
fn row_to_schedule(row: &rusqlite::Row) -> Result<Schedule, rusqlite::Error> {
    let times_json: String = row.get(2)?;
    let raw_times: Vec<String> =
        serde_json::from_str(&times_json).map_err(|e| conversion_err(2, e))?;
    let times = raw_times
        .iter()
        .map(|s| parse_hhmm(s).map_err(|e| conversion_err(2, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let frequency: Frequency = row
        .get::<_, String>(3)?
        .parse()
        .map_err(|e| conversion_err(3, e))?;

    let days_json: String = row.get(4)?;
    let days_of_week: Vec<u8> =
        serde_json::from_str(&days_json).map_err(|e| conversion_err(4, e))?;

    let start_date = parse_date(5, &row.get::<_, String>(5)?)?;
    let end_date = row
        .get::<_, Option<String>>(6)?
        .map(|s| parse_date(6, &s))
        .transpose()?;
    let created_at = parse_utc_dt(8, &row.get::<_, String>(8)?)?;

    Ok(Schedule {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        times,
        frequency,
        days_of_week,
        start_date,
        end_date,
        is_active: row.get::<_, i64>(7)? != 0,
        created_at,
    })
}

/// Build a Reminder from a database row.
fn row_to_reminder(row: &rusqlite::Row) -> Result<Reminder, rusqlite::Error> {
    Ok(Reminder {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        schedule_id: row.get(2)?,
        enabled: row.get::<_, i64>(3)? != 0,
        offset_minutes: row.get(4)?,
    })
}

/// Build an IntakeLog from a database row.
fn row_to_intake_log(row: &rusqlite::Row) -> Result<IntakeLog, rusqlite::Error> {
    let scheduled_time = row
        .get::<_, Option<String>>(2)?
        .map(|s| parse_naive_dt(2, &s))
        .transpose()?;
    let taken_time = parse_naive_dt(3, &row.get::<_, String>(3)?)?;
    let created_at = parse_utc_dt(6, &row.get::<_, String>(6)?)?;

    Ok(IntakeLog {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        scheduled_time,
        taken_time,
        amount_taken: row.get(4)?,
        notes: row.get(5)?,
        created_at,
    })
}

/// SQLite database for medication storage.
///
/// Medications own schedules, reminders, and intake logs; foreign keys are
/// enabled on every connection so deletes cascade down the tree.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open the database at `~/.config/medminder/medminder.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("medminder.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// The poller uses this to open its own connection inside the background
    /// task instead of sharing one across execution contexts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Path this database was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS medications (
                    id          TEXT PRIMARY KEY,
                    name        TEXT NOT NULL,
                    description TEXT,
                    dosage      TEXT NOT NULL,
                    notes       TEXT,
                    is_active   INTEGER NOT NULL DEFAULT 1,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS schedules (
                    id            TEXT PRIMARY KEY,
                    medication_id TEXT NOT NULL,
                    times         TEXT NOT NULL,
                    frequency     TEXT NOT NULL,
                    days_of_week  TEXT NOT NULL DEFAULT '[]',
                    start_date    TEXT NOT NULL,
                    end_date      TEXT,
                    is_active     INTEGER NOT NULL DEFAULT 1,
                    created_at    TEXT NOT NULL,
                    FOREIGN KEY (medication_id)
                        REFERENCES medications(id)
                        ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS reminders (
                    id             TEXT PRIMARY KEY,
                    medication_id  TEXT NOT NULL,
                    schedule_id    TEXT NOT NULL,
                    enabled        INTEGER NOT NULL DEFAULT 1,
                    offset_minutes INTEGER NOT NULL,
                    FOREIGN KEY (medication_id)
                        REFERENCES medications(id)
                        ON DELETE CASCADE,
                    FOREIGN KEY (schedule_id)
                        REFERENCES schedules(id)
                        ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS intake_logs (
                    id             TEXT PRIMARY KEY,
                    medication_id  TEXT NOT NULL,
                    scheduled_time TEXT,
                    taken_time     TEXT NOT NULL,
                    amount_taken   REAL NOT NULL,
                    notes          TEXT,
                    created_at     TEXT NOT NULL,
                    FOREIGN KEY (medication_id)
                        REFERENCES medications(id)
                        ON DELETE CASCADE
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Medication CRUD ===

    /// Create a new medication.
    pub fn create_medication(&self, medication: &Medication) -> Result<()> {
        medication.validate()?;
        self.conn.execute(
            "INSERT INTO medications (id, name, description, dosage, notes, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                medication.id,
                medication.name,
                medication.description,
                medication.dosage,
                medication.notes,
                medication.is_active as i64,
                medication.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: &str) -> Result<Medication> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, dosage, notes, is_active, created_at
             FROM medications WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_medication);
        match result {
            Ok(med) => {
                med.validate()?;
                Ok(med)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CoreError::NotFound {
                kind: "medication",
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// List all medications.
    pub fn list_medications(&self) -> Result<Vec<Medication>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, dosage, notes, is_active, created_at
             FROM medications ORDER BY name ASC",
        )?;
        let meds = stmt
            .query_map([], row_to_medication)?
            .collect::<Result<Vec<_>, _>>()?;
        for med in &meds {
            med.validate()?;
        }
        Ok(meds)
    }

    /// Update an existing medication.
    pub fn update_medication(&self, medication: &Medication) -> Result<()> {
        medication.validate()?;
        let changed = self.conn.execute(
            "UPDATE medications
             SET name = ?1, description = ?2, dosage = ?3, notes = ?4, is_active = ?5
             WHERE id = ?6",
            params![
                medication.name,
                medication.description,
                medication.dosage,
                medication.notes,
                medication.is_active as i64,
                medication.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "medication",
                id: medication.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete a medication. Cascades to its schedules, reminders, and
    /// intake logs.
    pub fn delete_medication(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM medications WHERE id = ?1", params![id])?;
        Ok(())
    }

    // === Schedule CRUD ===

    /// Create a new schedule.
    pub fn create_schedule(&self, schedule: &Schedule) -> Result<()> {
        schedule.validate()?;
        self.insert_schedule(schedule)?;
        Ok(())
    }

    fn insert_schedule(&self, schedule: &Schedule) -> Result<(), rusqlite::Error> {
        let times: Vec<String> = schedule.times.iter().map(|t| format_hhmm(*t)).collect();
        let times_json = serde_json::to_string(&times).map_err(|e| conversion_err(0, e))?;
        let days_json =
            serde_json::to_string(&schedule.days_of_week).map_err(|e| conversion_err(0, e))?;
        self.conn.execute(
            "INSERT INTO schedules (
                id, medication_id, times, frequency, days_of_week,
                start_date, end_date, is_active, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                schedule.id,
                schedule.medication_id,
                times_json,
                schedule.frequency.to_string(),
                days_json,
                schedule.start_date.to_string(),
                schedule.end_date.map(|d| d.to_string()),
                schedule.is_active as i64,
                schedule.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a schedule by ID.
    pub fn get_schedule(&self, id: &str) -> Result<Schedule> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, times, frequency, days_of_week,
                    start_date, end_date, is_active, created_at
             FROM schedules WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_schedule);
        match result {
            Ok(schedule) => {
                schedule.validate()?;
                Ok(schedule)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CoreError::NotFound {
                kind: "schedule",
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// List all schedules.
    pub fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, times, frequency, days_of_week,
                    start_date, end_date, is_active, created_at
             FROM schedules",
        )?;
        let schedules = stmt
            .query_map([], row_to_schedule)?
            .collect::<Result<Vec<_>, _>>()?;
        for schedule in &schedules {
            schedule.validate()?;
        }
        Ok(schedules)
    }

    /// Return all schedules associated with a medication.
    pub fn schedules_for_medication(&self, medication_id: &str) -> Result<Vec<Schedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, times, frequency, days_of_week,
                    start_date, end_date, is_active, created_at
             FROM schedules WHERE medication_id = ?1",
        )?;
        let schedules = stmt
            .query_map(params![medication_id], row_to_schedule)?
            .collect::<Result<Vec<_>, _>>()?;
        for schedule in &schedules {
            schedule.validate()?;
        }
        Ok(schedules)
    }

    /// Update an existing schedule.
    pub fn update_schedule(&self, schedule: &Schedule) -> Result<()> {
        schedule.validate()?;
        let times: Vec<String> = schedule.times.iter().map(|t| format_hhmm(*t)).collect();
        let changed = self.conn.execute(
            "UPDATE schedules
             SET times = ?1, frequency = ?2, days_of_week = ?3,
                 start_date = ?4, end_date = ?5, is_active = ?6
             WHERE id = ?7",
            params![
                serde_json::to_string(&times)?,
                schedule.frequency.to_string(),
                serde_json::to_string(&schedule.days_of_week)?,
                schedule.start_date.to_string(),
                schedule.end_date.map(|d| d.to_string()),
                schedule.is_active as i64,
                schedule.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "schedule",
                id: schedule.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete a schedule. Cascades to its reminders.
    pub fn delete_schedule(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Delete every schedule associated with the given medication.
    pub fn delete_schedules_for_medication(&self, medication_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM schedules WHERE medication_id = ?1",
            params![medication_id],
        )?;
        Ok(())
    }

    /// Replace a medication's schedules in a single transaction.
    ///
    /// Editing a dosing plan supersedes the old rows: delete then re-insert.
    /// Reminders attached to the old schedules cascade away with them.
    pub fn replace_schedules_for_medication(
        &self,
        medication_id: &str,
        schedules: &[Schedule],
    ) -> Result<()> {
        for schedule in schedules {
            schedule.validate()?;
        }

        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<(), rusqlite::Error> = (|| {
            self.conn.execute(
                "DELETE FROM schedules WHERE medication_id = ?1",
                params![medication_id],
            )?;
            for schedule in schedules {
                self.insert_schedule(schedule)?;
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err.into())
            }
        }
    }

    // === Reminder CRUD ===

    /// Create a new reminder.
    pub fn create_reminder(&self, reminder: &Reminder) -> Result<()> {
        reminder.validate()?;
        self.conn.execute(
            "INSERT INTO reminders (id, medication_id, schedule_id, enabled, offset_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reminder.id,
                reminder.medication_id,
                reminder.schedule_id,
                reminder.enabled as i64,
                reminder.offset_minutes,
            ],
        )?;
        Ok(())
    }

    /// Get a reminder by ID.
    pub fn get_reminder(&self, id: &str) -> Result<Reminder> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, schedule_id, enabled, offset_minutes
             FROM reminders WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_reminder);
        match result {
            Ok(reminder) => {
                reminder.validate()?;
                Ok(reminder)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CoreError::NotFound {
                kind: "reminder",
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// List all reminders.
    pub fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, schedule_id, enabled, offset_minutes FROM reminders",
        )?;
        let reminders = stmt
            .query_map([], row_to_reminder)?
            .collect::<Result<Vec<_>, _>>()?;
        for reminder in &reminders {
            reminder.validate()?;
        }
        Ok(reminders)
    }

    /// Return all reminders attached to a schedule.
    pub fn reminders_for_schedule(&self, schedule_id: &str) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, schedule_id, enabled, offset_minutes
             FROM reminders WHERE schedule_id = ?1",
        )?;
        let reminders = stmt
            .query_map(params![schedule_id], row_to_reminder)?
            .collect::<Result<Vec<_>, _>>()?;
        for reminder in &reminders {
            reminder.validate()?;
        }
        Ok(reminders)
    }

    /// Return all reminders attached to a medication.
    pub fn reminders_for_medication(&self, medication_id: &str) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, schedule_id, enabled, offset_minutes
             FROM reminders WHERE medication_id = ?1",
        )?;
        let reminders = stmt
            .query_map(params![medication_id], row_to_reminder)?
            .collect::<Result<Vec<_>, _>>()?;
        for reminder in &reminders {
            reminder.validate()?;
        }
        Ok(reminders)
    }

    /// Update an existing reminder.
    pub fn update_reminder(&self, reminder: &Reminder) -> Result<()> {
        reminder.validate()?;
        let changed = self.conn.execute(
            "UPDATE reminders
             SET medication_id = ?1, schedule_id = ?2, enabled = ?3, offset_minutes = ?4
             WHERE id = ?5",
            params![
                reminder.medication_id,
                reminder.schedule_id,
                reminder.enabled as i64,
                reminder.offset_minutes,
                reminder.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "reminder",
                id: reminder.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete a reminder.
    pub fn delete_reminder(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        Ok(())
    }

    // === IntakeLog CRUD ===

    /// Create a new intake log.
    pub fn create_intake_log(&self, log: &IntakeLog) -> Result<()> {
        log.validate()?;
        self.conn.execute(
            "INSERT INTO intake_logs (
                id, medication_id, scheduled_time, taken_time,
                amount_taken, notes, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.id,
                log.medication_id,
                log.scheduled_time.map(format_naive_dt),
                format_naive_dt(log.taken_time),
                log.amount_taken,
                log.notes,
                log.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get an intake log by ID.
    pub fn get_intake_log(&self, id: &str) -> Result<IntakeLog> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, scheduled_time, taken_time, amount_taken, notes, created_at
             FROM intake_logs WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_intake_log);
        match result {
            Ok(log) => {
                log.validate()?;
                Ok(log)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CoreError::NotFound {
                kind: "intake log",
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// List all intake logs.
    pub fn list_intake_logs(&self) -> Result<Vec<IntakeLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, scheduled_time, taken_time, amount_taken, notes, created_at
             FROM intake_logs ORDER BY taken_time DESC",
        )?;
        let logs = stmt
            .query_map([], row_to_intake_log)?
            .collect::<Result<Vec<_>, _>>()?;
        for log in &logs {
            log.validate()?;
        }
        Ok(logs)
    }

    /// Fetch every intake log recorded for the given medication.
    pub fn intake_logs_for_medication(&self, medication_id: &str) -> Result<Vec<IntakeLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, medication_id, scheduled_time, taken_time, amount_taken, notes, created_at
             FROM intake_logs WHERE medication_id = ?1",
        )?;
        let logs = stmt
            .query_map(params![medication_id], row_to_intake_log)?
            .collect::<Result<Vec<_>, _>>()?;
        for log in &logs {
            log.validate()?;
        }
        Ok(logs)
    }

    /// Update an existing intake log. Identity is immutable; content is not.
    pub fn update_intake_log(&self, log: &IntakeLog) -> Result<()> {
        log.validate()?;
        let changed = self.conn.execute(
            "UPDATE intake_logs
             SET medication_id = ?1, scheduled_time = ?2, taken_time = ?3,
                 amount_taken = ?4, notes = ?5
             WHERE id = ?6",
            params![
                log.medication_id,
                log.scheduled_time.map(format_naive_dt),
                format_naive_dt(log.taken_time),
                log.amount_taken,
                log.notes,
                log.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "intake log",
                id: log.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete an intake log.
    pub fn delete_intake_log(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM intake_logs WHERE id = ?1", params![id])?;
        Ok(())
    }
}
