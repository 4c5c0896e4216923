//! Reminder configuration commands for CLI.

use clap::Subcommand;
use medminder_core::{Database, Reminder};

use crate::common::CliError;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Attach a reminder to a schedule
    Add {
        /// Schedule ID
        schedule_id: String,
        /// Minutes before the dose to fire (0..=1440)
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// List reminders
    List {
        /// Filter by schedule ID
        #[arg(long)]
        schedule: Option<String>,
    },
    /// Enable a reminder
    Enable {
        /// Reminder ID
        id: String,
    },
    /// Disable a reminder
    Disable {
        /// Reminder ID
        id: String,
    },
    /// Remove a reminder
    Remove {
        /// Reminder ID
        id: String,
    },
}

fn set_enabled(db: &Database, id: &str, enabled: bool) -> Result<(), CliError> {
    let mut reminder = db.get_reminder(id)?;
    reminder.enabled = enabled;
    db.update_reminder(&reminder)?;
    println!(
        "Reminder {} {}",
        reminder.id,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub fn run(action: ReminderAction) -> Result<(), CliError> {
    let db = Database::open()?;

    match action {
        ReminderAction::Add {
            schedule_id,
            offset,
        } => {
            // The schedule carries the owning medication.
            let schedule = db.get_schedule(&schedule_id)?;
            let reminder = Reminder::new(schedule.medication_id, schedule_id, offset);
            db.create_reminder(&reminder)?;
            println!("Reminder created: {}", reminder.id);
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::List { schedule } => {
            let reminders = match schedule {
                Some(id) => db.reminders_for_schedule(&id)?,
                None => db.list_reminders()?,
            };
            println!("{}", serde_json::to_string_pretty(&reminders)?);
        }
        ReminderAction::Enable { id } => set_enabled(&db, &id, true)?,
        ReminderAction::Disable { id } => set_enabled(&db, &id, false)?,
        ReminderAction::Remove { id } => {
            db.delete_reminder(&id)?;
            println!("Reminder removed: {id}");
        }
    }
    Ok(())
}
