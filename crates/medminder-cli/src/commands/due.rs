//! Due, upcoming, and overdue dose queries for CLI.

use clap::Subcommand;
use medminder_core::{Database, ReminderEvent, ReminderService, ScheduleEngine};

use crate::common::{parse_date, CliError};

#[derive(Subcommand)]
pub enum DueAction {
    /// Untaken doses still ahead (with reminders configured)
    Upcoming,
    /// Doses currently inside their reminder window
    Due,
    /// Doses whose time has passed untaken
    Overdue,
    /// Past doses of one medication never logged as taken, with or without
    /// reminders configured
    Missed {
        /// Medication ID
        medication_id: String,
    },
    /// The next dose for one medication
    Next {
        /// Medication ID
        medication_id: String,
    },
    /// All doses planned for one day (defaults to today)
    Today {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
}

fn print_events(events: &[ReminderEvent]) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(events)?);
    Ok(())
}

pub fn run(action: DueAction) -> Result<(), CliError> {
    let db = Database::open()?;
    let service = ReminderService::new(&db);

    match action {
        DueAction::Upcoming => print_events(&service.get_upcoming()?)?,
        DueAction::Due => print_events(&service.get_due()?)?,
        DueAction::Overdue => print_events(&service.get_overdue()?)?,
        DueAction::Missed { medication_id } => {
            db.get_medication(&medication_id)?;
            let engine = ScheduleEngine::new(&db);
            let missed = engine.overdue_doses(&medication_id)?;
            if missed.is_empty() {
                println!("No missed doses");
            }
            for dose in missed {
                println!("{}", dose.format("%Y-%m-%d %H:%M"));
            }
        }
        DueAction::Next { medication_id } => {
            match service.get_next_for_medication(&medication_id)? {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => {
                    // No reminder-backed event; fall back to the raw timeline.
                    let engine = ScheduleEngine::new(&db);
                    match engine.next_dose(&medication_id)? {
                        Some(dose) => {
                            println!("Next dose (no reminder configured): {dose}")
                        }
                        None => println!("No upcoming doses"),
                    }
                }
            }
        }
        DueAction::Today { date } => {
            let engine = ScheduleEngine::new(&db);
            let day = match date {
                Some(d) => parse_date(&d)?,
                None => chrono::Local::now().date_naive(),
            };
            for (med, dose) in engine.doses_on(day)? {
                println!("{} {} ({})", dose.format("%H:%M"), med.name, med.dosage);
            }
        }
    }
    Ok(())
}
