//! Configuration commands for CLI.

use clap::Subcommand;
use medminder_core::Config;

use crate::common::CliError;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Get a config value
    Get {
        /// Config key ("notifications.enabled" or "poller.interval_secs")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load_or_default()?;
            match key.as_str() {
                "notifications.enabled" => println!("{}", config.notifications.enabled),
                "poller.interval_secs" => println!("{}", config.poller.interval_secs),
                _ => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default()?;
            match key.as_str() {
                "notifications.enabled" => config.notifications.enabled = value.parse()?,
                "poller.interval_secs" => config.poller.interval_secs = value.parse()?,
                _ => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
            config.save()?;
            println!("ok");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
