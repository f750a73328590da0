//! Command-line interface: one subcommand per job family.

pub mod commands;

pub use commands::{Cli, Commands, RunArgs};
