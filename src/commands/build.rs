//! Build command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{Config, FailurePolicy};
use crate::fetcher::Fetcher;
use crate::lock::LockGuard;
use crate::pipeline::Pipeline;
use crate::publisher::Publisher;
use crate::routes::AddressFamily;

/// Run the build command
pub async fn run(config_path: &Path, output_dir: &Path, keep_going: bool) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let policy = if keep_going {
        FailurePolicy::Continue
    } else {
        config.on_source_error
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let _lock = LockGuard::acquire(output_dir)?;

    let publisher = Publisher::new(output_dir);
    publisher.prepare()?;

    info!(
        "Building blocklists from {} sources into {:?}...",
        config.sources.len(),
        output_dir
    );

    let fetcher = Fetcher::new(&config.fetch)?;
    // An aborted run drops the writer and its staged files; the previously
    // published set stays as it was
    let mut writer = publisher.writer()?;
    let summary = Pipeline::new(&fetcher, policy)
        .run(&config.sources, &mut writer)
        .await?;

    let produced = publisher.commit(writer)?;
    let published = publisher.publish(&produced)?;

    if !summary.failures.is_empty() {
        warn!(
            "{} of {} sources failed and were skipped",
            summary.failures.len(),
            config.sources.len()
        );
    }

    println!();
    println!(
        "[OK] {} blocklists written to {:?} ({} IPv4, {} IPv6 entries)",
        published.blocklists.len(),
        output_dir,
        summary.total(AddressFamily::V4),
        summary.total(AddressFamily::V6)
    );
    for failure in &summary.failures {
        println!("[SKIPPED] {}", failure);
    }

    Ok(())
}
