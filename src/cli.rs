//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blocklister")]
#[command(author, version, about = "Build IP blocklists from static lists, JSON APIs and WHOIS")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every source and publish blocklists, checksums, archive and index
    Build {
        /// Output directory
        #[arg(short, long, default_value = "dist")]
        output_dir: PathBuf,

        /// Skip failing sources instead of aborting the run
        #[arg(long)]
        keep_going: bool,
    },

    /// Fetch a single source and print its routes
    Fetch {
        /// Source name as written in the config file
        source: String,
    },

    /// Validate the config file and list sources
    Check,

    /// Show version
    Version,
}
