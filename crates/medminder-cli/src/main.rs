use clap::{Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "medminder", version, about = "MedMinder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Medication management
    Med {
        #[command(subcommand)]
        action: commands::med::MedAction,
    },
    /// Dose schedule management
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Reminder configuration
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Intake logging
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Due, upcoming, and overdue doses
    Due {
        #[command(subcommand)]
        action: commands::due::DueAction,
    },
    /// Run the due-reminder poller in the foreground
    Watch {
        /// Override the poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Med { action } => commands::med::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Due { action } => commands::due::run(action),
        Commands::Watch { interval } => commands::watch::run(interval),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
