//! [`Args`] definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scrapes property listings and serves them over HTTP.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// What to run. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Entry points of the binary.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve,

    /// Scrape with the configured parameters and write a spreadsheet.
    Export {
        /// Output path. Defaults to the configured export path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
