use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::PUBLISHED_MODE;

pub const ARCHIVE_FILE: &str = "blocklists.tar.gz";

/// Pack the given files of `dir` into `blocklists.tar.gz`.
///
/// Entries are stored under their bare file names. The archive is built in
/// a temp file and renamed into place.
pub fn write_archive(dir: &Path, filenames: &[String]) -> Result<PathBuf> {
    let target = dir.join(ARCHIVE_FILE);
    let temp_file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;

    let encoder = GzEncoder::new(temp_file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.mode(tar::HeaderMode::Deterministic);

    for filename in filenames {
        let path = dir.join(filename);
        let mut file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
        builder
            .append_file(filename, &mut file)
            .with_context(|| format!("Failed to archive {:?}", path))?;
    }

    let temp_file = builder
        .into_inner()
        .context("Failed to finish tar stream")?
        .finish()
        .context("Failed to finish gzip stream")?;
    temp_file
        .as_file()
        .set_permissions(fs::Permissions::from_mode(PUBLISHED_MODE))
        .with_context(|| format!("Failed to set permissions on {:?}", temp_file.path()))?;
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(&target)
        .with_context(|| format!("Failed to persist {:?}", target))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_archive_contains_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.v4.blocklist"), "10.0.0.0/8\n").unwrap();
        fs::write(tmp.path().join("checksums.txt"), "abc a.v4.blocklist").unwrap();

        let path = write_archive(
            tmp.path(),
            &["a.v4.blocklist".to_string(), "checksums.txt".to_string()],
        )
        .unwrap();
        assert_eq!(path, tmp.path().join(ARCHIVE_FILE));
        assert_eq!(
            fs::metadata(&path).unwrap().permissions().mode() & 0o777,
            PUBLISHED_MODE
        );

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&path).unwrap()));
        let mut seen = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            seen.push((name, content));
        }

        assert_eq!(
            seen,
            vec![
                ("a.v4.blocklist".to_string(), "10.0.0.0/8\n".to_string()),
                ("checksums.txt".to_string(), "abc a.v4.blocklist".to_string()),
            ]
        );
    }

    #[test]
    fn test_archive_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(write_archive(tmp.path(), &["missing.v4.blocklist".to_string()]).is_err());
        assert!(!tmp.path().join(ARCHIVE_FILE).exists());
    }
}
