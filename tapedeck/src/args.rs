use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tapedeck recording inspector
#[derive(Debug, Parser)]
#[command(name = "tapedeck", about = "Inspect and replay recorded provider calls")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tapedeck.toml", env = "TAPEDECK_CONFIG")]
    pub config: PathBuf,

    /// Override the recordings directory
    #[arg(long, env = "TAPEDECK_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Override the test id scoping lookups
    #[arg(long)]
    pub test_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the fingerprint a request is stored under
    Fingerprint {
        /// HTTP method
        #[arg(short = 'X', long, default_value = "POST")]
        method: String,

        /// Request URL
        url: String,

        /// File holding the JSON request body, `-` for stdin
        #[arg(short, long)]
        body: Option<PathBuf>,

        /// Request header as `name: value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// Print a stored recording
    Show {
        /// Recording hash
        hash: String,
    },

    /// Print the HTTP error a recorded failure replays as
    ReplayError {
        /// Recording hash
        hash: String,
    },

    /// List stored recording hashes
    List,
}
