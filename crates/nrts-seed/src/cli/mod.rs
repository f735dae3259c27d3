//! Command-line interface for nrts-seed.
//!
//! This module provides the CLI structure for the `nrts-seed` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BackendArg, CheckCommand, ConfigCommand, RunCommand, ShowCommand, StoreArgs,
};

/// nrts-seed - Seed the NRTS development database
///
/// Ensures the sample Crown Land application exists in the document store.
/// Safe to run on every container start.
#[derive(Debug, Parser)]
#[command(name = "nrts-seed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Insert the seed record unless it already exists
    Run(RunCommand),

    /// Report whether the seed record exists, without writing
    Check(CheckCommand),

    /// Print the seed record as JSON
    Show(ShowCommand),

    /// View or validate configuration
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
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }

    /// The command to execute, `run` with defaults when none was given.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Run(RunCommand::default()))
    }
}
