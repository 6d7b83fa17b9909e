//! CLI module for cadence - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
