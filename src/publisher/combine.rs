use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use super::{write_atomic, ProducedFile};
use crate::pipeline::blocklist_filename;
use crate::routes::AddressFamily;

pub fn combined_filename(family: AddressFamily) -> String {
    blocklist_filename("combined", family)
}

/// Concatenate the per-source files of each family, in run order.
///
/// Both combined files are always written, even when empty. Returns their
/// file names, IPv4 first.
pub fn combine_blocklists(dir: &Path, produced: &[ProducedFile]) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(AddressFamily::ALL.len());

    for family in AddressFamily::ALL {
        let mut combined = Vec::new();
        let mut count = 0;
        for file in produced.iter().filter(|p| p.family == family) {
            let path = dir.join(&file.filename);
            let content = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
            combined.extend_from_slice(&content);
            count += file.count;
        }

        let filename = combined_filename(family);
        write_atomic(&dir.join(&filename), &combined)?;
        info!("Wrote {} ({} {} entries)", filename, count, family);
        written.push(filename);
    }

    Ok(written)
}
