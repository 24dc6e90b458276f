//! Command-line interface for cardiosync.
//!
//! This module provides the CLI structure and command handlers for the
//! `cardiosync` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, GenderArg, RemoteCommand, ShowCommand, SubmitCommand};

/// cardiosync - Record acute cardiac-failure observations
///
/// Appends each observation to a local CSV dataset and keeps one copy of
/// that dataset in a remote store.
#[derive(Debug, Parser)]
#[command(name = "cardiosync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append one observation and sync the dataset
    Submit(SubmitCommand),

    /// Print the local dataset
    Show(ShowCommand),

    /// Check whether the remote copy exists
    Remote(RemoteCommand),

    /// Digest a password read from stdin for `auth.password_digest`
    HashPassword,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
