//! Advisory lock on the output directory.
//!
//! Two builds writing into the same directory would interleave their files,
//! so `build` holds this lock for the whole run.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = ".blocklister.lock";

/// Holds an exclusive lock on `{dir}/.blocklister.lock`.
/// The lock is released when the guard is dropped.
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Try to take the lock without blocking.
    /// Fails if another build already holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);

        // create+read+write without truncate, so an existing lock file is reused
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another build is already writing to {:?}.\n\
                 Wait for it to finish, or remove the lock file: {:?}",
                dir,
                path
            )
        })?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
