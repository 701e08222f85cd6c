//! Fetch command: query one source and print what it returns.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::error::SourceError;
use crate::fetcher::{Fetcher, SourceFetcher};
use crate::routes::AddressFamily;

pub async fn run(source_name: &str, config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let source = config.source(source_name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown source '{}'. Run 'blocklister check' to list sources",
            source_name
        )
    })?;

    let fetcher = Fetcher::new(&config.fetch)?;
    let routes = fetcher
        .fetch_source(source)
        .await
        .map_err(|error| SourceError {
            source_name: source.name.clone(),
            error,
        })?;

    for family in AddressFamily::ALL {
        let set = routes.get(family);
        println!("# {} {} ({} entries)", source.name, family, set.len());
        for route in set {
            println!("{}", route);
        }
    }

    Ok(())
}
