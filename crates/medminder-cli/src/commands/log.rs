//! Intake logging commands for CLI.

use clap::Subcommand;
use medminder_core::{Database, IntakeLog};

use crate::common::{parse_datetime, CliError};

#[derive(Subcommand)]
pub enum LogAction {
    /// Record an intake
    Add {
        /// Medication ID
        medication_id: String,
        /// Amount taken, in dose units
        #[arg(long, default_value = "1.0")]
        amount: f64,
        /// The planned dose this intake fulfils (YYYY-MM-DDTHH:MM[:SS]).
        /// Must match the expanded dose timestamp exactly; omit for a
        /// manual, unplanned intake.
        #[arg(long)]
        scheduled: Option<String>,
        /// When the dose was actually taken; defaults to now
        #[arg(long)]
        taken: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List intake logs
    List {
        /// Filter by medication ID
        #[arg(long)]
        medication: Option<String>,
    },
    /// Remove an intake log
    Remove {
        /// Log ID
        id: String,
    },
}

pub fn run(action: LogAction) -> Result<(), CliError> {
    let db = Database::open()?;

    match action {
        LogAction::Add {
            medication_id,
            amount,
            scheduled,
            taken,
            notes,
        } => {
            db.get_medication(&medication_id)?;
            let mut log = IntakeLog::new(medication_id, amount);
            if let Some(scheduled) = scheduled {
                log.scheduled_time = Some(parse_datetime(&scheduled)?);
            }
            if let Some(taken) = taken {
                log.taken_time = parse_datetime(&taken)?;
            }
            log.notes = notes;
            db.create_intake_log(&log)?;
            println!("Intake logged: {}", log.id);
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        LogAction::List { medication } => {
            let logs = match medication {
                Some(id) => db.intake_logs_for_medication(&id)?,
                None => db.list_intake_logs()?,
            };
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        LogAction::Remove { id } => {
            db.delete_intake_log(&id)?;
            println!("Intake log removed: {id}");
        }
    }
    Ok(())
}
