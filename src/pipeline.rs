//! Sequential driver that turns configured sources into blocklist units.

use anyhow::Result;
use tracing::{error, info};

use crate::config::{FailurePolicy, SourceConfig};
use crate::error::SourceError;
use crate::fetcher::SourceFetcher;
use crate::routes::AddressFamily;

/// One non-empty family of one source, ready to be written out
#[derive(Debug, Clone, Copy)]
pub struct OutputUnit<'a> {
    pub source: &'a str,
    pub family: AddressFamily,
    pub routes: &'a [String],
}

impl OutputUnit<'_> {
    /// File name the unit is published under
    pub fn filename(&self) -> String {
        blocklist_filename(self.source, self.family)
    }
}

pub fn blocklist_filename(source: &str, family: AddressFamily) -> String {
    format!("{}.v{}.blocklist", source, family.number())
}

/// Receives output units as soon as a source has been fetched
pub trait BlocklistSink {
    fn emit(&mut self, unit: OutputUnit<'_>) -> Result<()>;
}

/// Route counts for a source that was fetched successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub name: String,
    pub ipv4: usize,
    pub ipv6: usize,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
    /// Only populated under [`FailurePolicy::Continue`]
    pub failures: Vec<SourceError>,
}

impl RunSummary {
    pub fn total(&self, family: AddressFamily) -> usize {
        self.sources
            .iter()
            .map(|s| match family {
                AddressFamily::V4 => s.ipv4,
                AddressFamily::V6 => s.ipv6,
            })
            .sum()
    }
}

pub struct Pipeline<'a, F: SourceFetcher> {
    fetcher: &'a F,
    policy: FailurePolicy,
}

impl<'a, F: SourceFetcher> Pipeline<'a, F> {
    pub fn new(fetcher: &'a F, policy: FailurePolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Fetch every source in order and emit its non-empty families.
    ///
    /// Routes for a source are dropped once emitted. Under
    /// [`FailurePolicy::Abort`] the first failing source ends the run with a
    /// [`SourceError`]; sink errors always end the run.
    pub async fn run(
        &self,
        sources: &[SourceConfig],
        sink: &mut dyn BlocklistSink,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for source in sources {
            let routes = match self.fetcher.fetch_source(source).await {
                Ok(routes) => routes,
                Err(e) => {
                    let failure = SourceError {
                        source_name: source.name.clone(),
                        error: e,
                    };
                    match self.policy {
                        FailurePolicy::Abort => return Err(failure.into()),
                        FailurePolicy::Continue => {
                            error!("{}", failure);
                            summary.failures.push(failure);
                            continue;
                        }
                    }
                }
            };

            info!(
                "{}: {} IPv4 - | {} IPv6",
                source.name,
                routes.ipv4.len(),
                routes.ipv6.len()
            );

            for family in AddressFamily::ALL {
                let set = routes.get(family);
                if set.is_empty() {
                    continue;
                }
                sink.emit(OutputUnit {
                    source: &source.name,
                    family,
                    routes: set,
                })?;
            }

            summary.sources.push(SourceSummary {
                name: source.name.clone(),
                ipv4: routes.ipv4.len(),
                ipv6: routes.ipv6.len(),
            });
        }

        Ok(summary)
    }
}
