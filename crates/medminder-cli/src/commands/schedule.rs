//! Dose schedule commands for CLI.

use clap::Subcommand;
use medminder_core::{expand, Database, Frequency, Schedule};

use crate::common::{parse_date, parse_times, parse_weekdays, CliError};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Add a schedule for a medication
    Add {
        /// Medication ID
        medication_id: String,
        /// Comma-separated times of day, e.g. "08:00,20:00"
        #[arg(long)]
        times: String,
        /// Frequency: daily, weekly, or custom
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Comma-separated weekday restriction, 0=Mon .. 6=Sun
        #[arg(long)]
        days: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD); omit for an open-ended schedule
        #[arg(long)]
        end: Option<String>,
    },
    /// List schedules
    List {
        /// Filter by medication ID
        #[arg(long)]
        medication: Option<String>,
    },
    /// Print every dose timestamp a schedule expands to
    Timeline {
        /// Schedule ID
        id: String,
    },
    /// Replace all of a medication's schedules with one new schedule
    Replace {
        /// Medication ID
        medication_id: String,
        /// Comma-separated times of day
        #[arg(long)]
        times: String,
        /// Frequency: daily, weekly, or custom
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Comma-separated weekday restriction, 0=Mon .. 6=Sun
        #[arg(long)]
        days: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Remove a schedule (and its reminders)
    Remove {
        /// Schedule ID
        id: String,
    },
}

fn build_schedule(
    medication_id: String,
    times: &str,
    frequency: &str,
    days: Option<&str>,
    start: &str,
    end: Option<&str>,
) -> Result<Schedule, CliError> {
    let mut schedule = Schedule::new(medication_id, parse_times(times)?, parse_date(start)?);
    schedule.frequency = frequency.parse::<Frequency>()?;
    if let Some(days) = days {
        schedule.days_of_week = parse_weekdays(days)?;
    }
    if let Some(end) = end {
        schedule.end_date = Some(parse_date(end)?);
    }
    Ok(schedule)
}

pub fn run(action: ScheduleAction) -> Result<(), CliError> {
    let db = Database::open()?;

    match action {
        ScheduleAction::Add {
            medication_id,
            times,
            frequency,
            days,
            start,
            end,
        } => {
            // Fails early when the medication does not exist.
            db.get_medication(&medication_id)?;
            let schedule = build_schedule(
                medication_id,
                &times,
                &frequency,
                days.as_deref(),
                &start,
                end.as_deref(),
            )?;
            db.create_schedule(&schedule)?;
            println!("Schedule created: {}", schedule.id);
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::List { medication } => {
            let schedules = match medication {
                Some(id) => db.schedules_for_medication(&id)?,
                None => db.list_schedules()?,
            };
            println!("{}", serde_json::to_string_pretty(&schedules)?);
        }
        ScheduleAction::Timeline { id } => {
            let schedule = db.get_schedule(&id)?;
            let doses = expand(&schedule)?;
            if doses.is_empty() {
                println!("(no finite timeline: schedule is open-ended)");
            }
            for dose in doses {
                println!("{}", dose.format("%Y-%m-%d %H:%M"));
            }
        }
        ScheduleAction::Replace {
            medication_id,
            times,
            frequency,
            days,
            start,
            end,
        } => {
            db.get_medication(&medication_id)?;
            let schedule = build_schedule(
                medication_id.clone(),
                &times,
                &frequency,
                days.as_deref(),
                &start,
                end.as_deref(),
            )?;
            db.replace_schedules_for_medication(&medication_id, std::slice::from_ref(&schedule))?;
            println!("Schedules replaced for medication {medication_id}");
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::Remove { id } => {
            db.delete_schedule(&id)?;
            println!("Schedule removed: {id}");
        }
    }
    Ok(())
}
