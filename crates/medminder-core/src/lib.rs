//! # MedMinder Core Library
//!
//! This library provides the core business logic for the MedMinder medication
//! manager. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary over the same core library.
//!
//! ## Architecture
//!
//! - **Models**: Medications, schedules, reminders, and intake logs, each
//!   carrying its own validation
//! - **Storage**: SQLite-based persistence and TOML-based configuration
//! - **Engine**: Pure expansion of recurrence rules into dose timestamps
//! - **Reminders**: Derived reminder events with fresh taken/overdue state
//! - **Poller**: Background task that fires due reminders once per minute
//!
//! ## Key Components
//!
//! - [`Database`]: Medication tree persistence
//! - [`Config`]: Application configuration management
//! - [`ScheduleEngine`]: Dose timeline queries
//! - [`ReminderService`]: Reminder event generation
//! - [`DuePoller`]: Background due-reminder scanning

pub mod engine;
pub mod error;
pub mod model;
pub mod poller;
pub mod reminders;
pub mod storage;

pub use engine::{expand, ScheduleEngine};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use model::{Frequency, IntakeLog, Medication, Reminder, ReminderEvent, Schedule};
pub use poller::{due_reminders_at, DuePoller, DueReminder, NotifierConfig};
pub use reminders::ReminderService;
pub use storage::{data_dir, Config, Database};
