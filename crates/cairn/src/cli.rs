//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Dead-letter tooling for graph batch writes")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the dead-letter records under the configured destination
    Inspect {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}
