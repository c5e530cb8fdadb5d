//! CLI module
//!
//! One binary, `salsadig`, with a subcommand per table operation and job.
//!
//! # Commands
//!
//! - `count`, `describe`, `query`, `list` - read tables
//! - `save`, `delete` - write one record (dry run without `--live`)
//! - `address-fixer`, `delete-donations`, `delete-supporter-groups`,
//!   `delete-groups`, `email-year-stats`, `blast-donation-report`,
//!   `export`, `group-overlap` - batch jobs

mod commands;
mod runner;

pub use commands::{Cli, Commands, FetchArgs, OutputFormat, TableArgs, WindowArgs};
pub use runner::Runner;

#[cfg(test)]
mod tests;
