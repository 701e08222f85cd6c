//! # blocklister - IP blocklist builder
//!
//! Collects network prefixes ("routes") from heterogeneous upstreams and
//! publishes them as per-source blocklist files with checksums, a tarball
//! and an index page.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       blocklister                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: build, fetch, check, version               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── Sources in file order, fetch limits, failure policy  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pipeline (sequential)                                      │
//! │    └── Fetcher: static → JSON (reqwest) → WHOIS (tcp/43)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Publisher                                                  │
//! │    └── per-source files, combined, sha256, tar.gz, html     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use blocklister::config::Config;
//! use blocklister::fetcher::Fetcher;
//! use blocklister::pipeline::Pipeline;
//! use blocklister::publisher::Publisher;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yml")?;
//!
//!     let publisher = Publisher::new("dist");
//!     publisher.prepare()?;
//!
//!     let fetcher = Fetcher::new(&config.fetch)?;
//!     let mut writer = publisher.writer()?;
//!     Pipeline::new(&fetcher, config.on_source_error)
//!         .run(&config.sources, &mut writer)
//!         .await?;
//!
//!     let produced = publisher.commit(writer)?;
//!     publisher.publish(&produced)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Fetch error taxonomy
//! - [`fetcher`] - Per-source route collection
//! - [`lock`] - Output directory locking
//! - [`pipeline`] - Sequential driver over all sources
//! - [`publisher`] - Blocklist files, checksums, archive, index page
//! - [`routes`] - Address families and route sets
//! - [`whois`] - WHOIS client and route object parser

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lock;
pub mod pipeline;
pub mod publisher;
pub mod routes;
pub mod whois;

pub use config::Config;
pub use error::{FetchError, SourceError};
