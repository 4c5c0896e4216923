//! Core error types for medminder-core.
//!
//! Three failure families stay distinguishable for callers: validation
//! (malformed data, recoverable by fixing the input), not-found (the
//! identifier simply does not exist), and database (storage is broken).

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Core error type for medminder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A record was requested by an identifier that does not exist
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
///
/// Raised synchronously at the point of use; a record that fails one of
/// these never reaches storage and never expands into dose timestamps.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("schedule must include at least one time of day")]
    EmptyTimes,

    #[error("duplicate time of day: {time}")]
    DuplicateTime { time: NaiveTime },

    #[error("invalid frequency '{value}' (allowed: daily, weekly, custom)")]
    InvalidFrequency { value: String },

    #[error("weekly schedules must specify at least one weekday")]
    MissingWeekdays,

    #[error("invalid weekday {day} (must be 0=Mon .. 6=Sun)")]
    InvalidWeekday { day: u8 },

    #[error("start date {start} cannot be after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("reminder offset cannot be negative (got {minutes})")]
    NegativeOffset { minutes: i64 },

    #[error("reminder offset cannot exceed 1440 minutes (got {minutes})")]
    OffsetTooLarge { minutes: i64 },

    #[error("'{field}' must be a non-empty string")]
    EmptyField { field: &'static str },

    #[error("'{field}' cannot be in the future")]
    FutureTimestamp { field: &'static str },

    #[error("taken time {taken} cannot be earlier than scheduled time {scheduled}")]
    TakenBeforeScheduled {
        scheduled: NaiveDateTime,
        taken: NaiveDateTime,
    },

    #[error("amount taken cannot be negative (got {amount})")]
    NegativeAmount { amount: f64 },

    #[error("'{field}' is too long ({len} chars, max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
