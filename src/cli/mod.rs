//! Command-line interface for habitrack.

use clap::{Parser, Subcommand};

/// habitrack - Habit tracking API server
#[derive(Parser)]
#[command(name = "habitrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "s")]
    Serve,

    /// Write a default config.toml to the current directory
    Init,

    /// Load and validate the configuration, then exit
    #[command(alias = "check")]
    CheckConfig,

    /// Print an argon2 hash for a password
    HashPassword {
        /// Password to hash
        password: String,
    },
}

impl Cli {
    /// Subcommand to run; `serve` when none was given.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
