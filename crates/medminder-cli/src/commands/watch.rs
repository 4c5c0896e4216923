//! Foreground due-reminder watcher.
//!
//! Runs the poller until Ctrl-C, printing a notification line for each
//! reminder that comes due.

use std::sync::Arc;

use medminder_core::{data_dir, Config, Database, DuePoller, NotifierConfig};

use crate::common::CliError;

pub fn run(interval_override: Option<u64>) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load_or_default()?;
    let interval_secs = interval_override.unwrap_or(config.poller.interval_secs);
    let notifier = NotifierConfig::new(config.notifications.enabled);

    let db_path = data_dir()?.join("medminder.db");
    // Open once up front so schema problems surface before the task starts.
    Database::open_at(&db_path)?;

    let poller = DuePoller::new(
        db_path,
        std::time::Duration::from_secs(interval_secs),
        notifier.clone(),
        Arc::new(|due| {
            println!(
                "Time to take {} ({})!",
                due.medication.name, due.medication.dosage
            );
        }),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        poller.start().await;
        println!(
            "Watching for due reminders every {interval_secs}s (notifications {}). Ctrl-C to stop.",
            if notifier.enabled() { "on" } else { "off" }
        );
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("error: {e}");
        }
        poller.stop().await;
    });
    Ok(())
}
