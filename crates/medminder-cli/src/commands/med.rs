//! Medication management commands for CLI.

use clap::Subcommand;
use medminder_core::{Database, Medication};

use crate::common::CliError;

#[derive(Subcommand)]
pub enum MedAction {
    /// Add a new medication
    Add {
        /// Medication name
        name: String,
        /// Dosage text, e.g. "100mg" or "2 tablets"
        dosage: String,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List medications
    List,
    /// Get medication details
    Get {
        /// Medication ID
        id: String,
    },
    /// Update a medication
    Update {
        /// Medication ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New dosage text
        #[arg(long)]
        dosage: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Set active status
        #[arg(long)]
        active: Option<bool>,
    },
    /// Remove a medication (and its schedules, reminders, and logs)
    Remove {
        /// Medication ID
        id: String,
    },
}

pub fn run(action: MedAction) -> Result<(), CliError> {
    let db = Database::open()?;

    match action {
        MedAction::Add {
            name,
            dosage,
            description,
            notes,
        } => {
            let mut med = Medication::new(name, dosage);
            med.description = description;
            med.notes = notes;
            db.create_medication(&med)?;
            println!("Medication created: {}", med.id);
            println!("{}", serde_json::to_string_pretty(&med)?);
        }
        MedAction::List => {
            let meds = db.list_medications()?;
            println!("{}", serde_json::to_string_pretty(&meds)?);
        }
        MedAction::Get { id } => {
            let med = db.get_medication(&id)?;
            println!("{}", serde_json::to_string_pretty(&med)?);
        }
        MedAction::Update {
            id,
            name,
            dosage,
            description,
            notes,
            active,
        } => {
            let mut med = db.get_medication(&id)?;
            if let Some(name) = name {
                med.name = name;
            }
            if let Some(dosage) = dosage {
                med.dosage = dosage;
            }
            if let Some(description) = description {
                med.description = Some(description);
            }
            if let Some(notes) = notes {
                med.notes = Some(notes);
            }
            if let Some(active) = active {
                med.is_active = active;
            }
            db.update_medication(&med)?;
            println!("{}", serde_json::to_string_pretty(&med)?);
        }
        MedAction::Remove { id } => {
            db.delete_medication(&id)?;
            println!("Medication removed: {id}");
        }
    }
    Ok(())
}
