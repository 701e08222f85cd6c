//! blocklister - IP blocklist builder
//!
//! Collects routes from static lists, JSON APIs and WHOIS servers and
//! publishes them as versioned blocklist files.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use blocklister::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build {
            output_dir,
            keep_going,
        } => blocklister::commands::build::run(&cli.config, &output_dir, keep_going).await,
        Commands::Fetch { source } => blocklister::commands::fetch::run(&source, &cli.config).await,
        Commands::Check => blocklister::commands::check::run(&cli.config).await,
        Commands::Version => {
            println!("blocklister {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
