use anyhow::Result;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

use super::write_atomic;
use crate::pipeline::{BlocklistSink, OutputUnit};
use crate::routes::AddressFamily;

/// A blocklist file written during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedFile {
    pub filename: String,
    pub family: AddressFamily,
    pub count: usize,
}

/// Writes `{source}.v{family}.blocklist`, one prefix per line, into a
/// staging directory.
///
/// Nothing reaches the output directory until `Publisher::commit`. Dropping
/// the writer discards the staged files.
pub struct BlocklistWriter {
    staging: TempDir,
    produced: Vec<ProducedFile>,
}

impl BlocklistWriter {
    pub fn new(staging: TempDir) -> Self {
        Self {
            staging,
            produced: Vec::new(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    /// Files written so far, in write order
    pub fn produced(&self) -> &[ProducedFile] {
        &self.produced
    }

    pub(crate) fn into_parts(self) -> (TempDir, Vec<ProducedFile>) {
        (self.staging, self.produced)
    }
}

impl BlocklistSink for BlocklistWriter {
    fn emit(&mut self, unit: OutputUnit<'_>) -> Result<()> {
        let filename = unit.filename();
        let mut content = unit.routes.join("\n");
        content.push('\n');

        write_atomic(&self.staging.path().join(&filename), content.as_bytes())?;
        debug!("Wrote {} ({} entries)", filename, unit.routes.len());

        self.produced.push(ProducedFile {
            filename,
            family: unit.family,
            count: unit.routes.len(),
        });
        Ok(())
    }
}
