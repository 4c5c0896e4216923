//! Medications: the root of the ownership tree.
//!
//! Deleting a medication cascades to its schedules, reminders, and intake
//! logs at the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DOSAGE_LEN: usize = 50;
pub const MAX_NOTES_LEN: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Free-form dosage text, e.g. "10mg" or "2 tablets".
    pub dosage: String,
    pub notes: Option<String>,
    /// Archived medications stay queryable but inactive.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    pub fn new(name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            dosage: dosage.into(),
            notes: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "id" });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                len: self.name.chars().count(),
                max: MAX_NAME_LEN,
            });
        }
        if self.dosage.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "dosage" });
        }
        if self.dosage.chars().count() > MAX_DOSAGE_LEN {
            return Err(ValidationError::TooLong {
                field: "dosage",
                len: self.dosage.chars().count(),
                max: MAX_DOSAGE_LEN,
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
