use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

use super::write_atomic;

pub const CHECKSUMS_JSON: &str = "checksums.json";
pub const CHECKSUMS_TXT: &str = "checksums.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumEntry {
    pub filename: String,
    pub sha256: String,
}

/// SHA-256 of each file, in the order given
pub fn compute_checksums(dir: &Path, filenames: &[String]) -> Result<Vec<ChecksumEntry>> {
    filenames
        .iter()
        .map(|filename| {
            let path = dir.join(filename);
            let mut file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
            let mut hasher = Sha256::new();
            io::copy(&mut file, &mut hasher).with_context(|| format!("Failed to read {:?}", path))?;
            Ok(ChecksumEntry {
                filename: filename.clone(),
                sha256: hex::encode(hasher.finalize()),
            })
        })
        .collect()
}

/// `"{sha256} {filename}"` lines joined with `\n`
pub fn checksums_text(entries: &[ChecksumEntry]) -> String {
    entries
        .iter()
        .map(|c| format!("{} {}", c.sha256, c.filename))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `checksums.json` and `checksums.txt`
pub fn write_checksums(dir: &Path, entries: &[ChecksumEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).context("Failed to serialize checksums")?;
    write_atomic(&dir.join(CHECKSUMS_JSON), json.as_bytes())?;
    write_atomic(&dir.join(CHECKSUMS_TXT), checksums_text(entries).as_bytes())?;
    Ok(())
}
