//! Output directory management: blocklist files and everything derived from
//! them (combined lists, checksums, archive, index page).

mod archive;
mod checksum;
mod combine;
mod index;
mod writer;

pub use archive::{write_archive, ARCHIVE_FILE};
pub use checksum::{compute_checksums, write_checksums, ChecksumEntry, CHECKSUMS_JSON, CHECKSUMS_TXT};
pub use combine::{combine_blocklists, combined_filename};
pub use index::{render_index, INDEX_FILE};
pub use writer::{BlocklistWriter, ProducedFile};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::routes::AddressFamily;

const BLOCKLIST_SUFFIX: &str = ".blocklist";
const STAGING_PREFIX: &str = ".staging-";

/// Mode of every published file; they are served by other users
pub(crate) const PUBLISHED_MODE: u32 = 0o644;

/// What a publish pass wrote
#[derive(Debug)]
pub struct PublishSummary {
    pub blocklists: Vec<String>,
    pub checksums: Vec<ChecksumEntry>,
    pub archive: PathBuf,
    pub index: PathBuf,
}

pub struct Publisher {
    dir: PathBuf,
}

impl Publisher {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.dir))
    }

    /// Sink that stages per-source blocklists next to the output directory
    pub fn writer(&self) -> Result<BlocklistWriter> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.dir)
            .with_context(|| format!("Failed to create staging directory in {:?}", self.dir))?;
        Ok(BlocklistWriter::new(staging))
    }

    /// Move the staged blocklists into the output directory.
    ///
    /// Blocklists of earlier runs that this run did not produce are removed
    /// afterwards, so retired sources and families do not linger. Combined
    /// files are left for `publish` to overwrite.
    pub fn commit(&self, writer: BlocklistWriter) -> Result<Vec<ProducedFile>> {
        let (staging, produced) = writer.into_parts();

        for file in &produced {
            let from = staging.path().join(&file.filename);
            let to = self.dir.join(&file.filename);
            fs::rename(&from, &to)
                .with_context(|| format!("Failed to move {:?} to {:?}", from, to))?;
        }

        let mut keep: HashSet<String> = produced.iter().map(|p| p.filename.clone()).collect();
        keep.extend(AddressFamily::ALL.into_iter().map(combined_filename));

        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list output directory: {:?}", self.dir))?
        {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.ends_with(BLOCKLIST_SUFFIX)
                && !keep.contains(&name)
                && entry.file_type()?.is_file()
            {
                debug!("Removing stale {}", name);
                fs::remove_file(entry.path())
                    .with_context(|| format!("Failed to remove {:?}", entry.path()))?;
            }
        }

        staging
            .close()
            .with_context(|| format!("Failed to remove staging directory in {:?}", self.dir))?;
        Ok(produced)
    }

    /// Combine, checksum, archive and index the produced blocklists
    pub fn publish(&self, produced: &[ProducedFile]) -> Result<PublishSummary> {
        let combined = combine_blocklists(&self.dir, produced)?;

        let mut blocklists: Vec<String> = produced.iter().map(|p| p.filename.clone()).collect();
        blocklists.extend(combined);

        let checksums = compute_checksums(&self.dir, &blocklists)?;
        write_checksums(&self.dir, &checksums)?;
        info!("Wrote checksums for {} blocklists", checksums.len());

        let mut archived = blocklists.clone();
        archived.push(CHECKSUMS_JSON.to_string());
        archived.push(CHECKSUMS_TXT.to_string());
        let archive = write_archive(&self.dir, &archived)?;
        info!("Wrote {:?}", archive);

        let html = render_index(&checksums, chrono::Local::now());
        let index = self.dir.join(INDEX_FILE);
        write_atomic(&index, html.as_bytes())?;
        info!("Wrote {:?}", index);

        Ok(PublishSummary {
            blocklists,
            checksums,
            archive,
            index,
        })
    }
}

/// Write a file atomically (temp file in the same directory, then rename)
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent_dir = path.parent().unwrap_or(Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", parent_dir))?;

    temp_file.write_all(contents)?;
    temp_file
        .as_file()
        .set_permissions(fs::Permissions::from_mode(PUBLISHED_MODE))
        .with_context(|| format!("Failed to set permissions on {:?}", temp_file.path()))?;
    temp_file.as_file().sync_all()?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist {:?}", path))?;

    Ok(())
}
