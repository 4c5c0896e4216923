pub mod config;
pub mod due;
pub mod log;
pub mod med;
pub mod reminder;
pub mod schedule;
pub mod watch;
