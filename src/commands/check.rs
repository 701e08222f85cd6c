//! Check command: validate the config and describe each source.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::routes::AddressFamily;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    println!("Config OK: {:?}", config_path);
    println!("On source error: {:?}", config.on_source_error);
    println!();
    println!(" SOURCE               MECHANISMS          STATIC v4/v6");
    println!(" ──────────────────── ─────────────────── ─────────────");
    for source in &config.sources {
        println!(
            " {:<20} {:<19} {}/{}",
            source.name,
            source.mechanisms().join(","),
            source.static_routes(AddressFamily::V4).len(),
            source.static_routes(AddressFamily::V6).len()
        );
    }
    println!();
    println!("{} sources", config.sources.len());

    Ok(())
}
