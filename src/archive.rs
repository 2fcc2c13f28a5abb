//! Archive browsing module
//!
//! Treats a subtitle archive like a read-only directory: its files can be
//! listed and copied out one by one.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while browsing an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Failed to open the archive file
    #[error("Failed to open archive {path}: {source}")]
    OpenFailed { path: PathBuf, source: io::Error },

    /// The archive is corrupt or uses an unsupported feature
    #[error("Invalid archive: {0}")]
    Invalid(#[from] zip::result::ZipError),

    /// Failed to write an extracted file
    #[error("Failed to extract {entry} to {path}: {source}")]
    ExtractFailed {
        entry: String,
        path: PathBuf,
        source: io::Error,
    },
}

/// Read access to the files inside an archive.
pub trait ArchiveBrowser {
    /// Lists the files (not directories) in the archive, in archive order.
    fn list_files(&self, archive: &Path) -> Result<Vec<String>, ArchiveError>;

    /// Copies the file `entry` out of the archive to `destination`.
    fn copy_entry(
        &self,
        archive: &Path,
        entry: &str,
        destination: &Path,
    ) -> Result<(), ArchiveError>;
}

/// Browser for zip archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipBrowser;

impl ZipBrowser {
    fn open(archive: &Path) -> Result<zip::ZipArchive<File>, ArchiveError> {
        let file = File::open(archive).map_err(|e| ArchiveError::OpenFailed {
            path: archive.to_path_buf(),
            source: e,
        })?;

        Ok(zip::ZipArchive::new(file)?)
    }
}

impl ArchiveBrowser for ZipBrowser {
    fn list_files(&self, archive: &Path) -> Result<Vec<String>, ArchiveError> {
        let mut zip = Self::open(archive)?;
        let mut files = Vec::new();

        for index in 0..zip.len() {
            let entry = zip.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            // Names like `../x` would land outside the extraction directory
            if entry.enclosed_name().is_none() {
                warn!(entry = entry.name(), "Skipping archive entry with unsafe path");
                continue;
            }
            files.push(entry.name().to_string());
        }

        Ok(files)
    }

    fn copy_entry(
        &self,
        archive: &Path,
        entry: &str,
        destination: &Path,
    ) -> Result<(), ArchiveError> {
        let mut zip = Self::open(archive)?;
        let mut source = zip.by_name(entry)?;

        let extract_failed = |e: io::Error| ArchiveError::ExtractFailed {
            entry: entry.to_string(),
            path: destination.to_path_buf(),
            source: e,
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(extract_failed)?;
        }
        let mut target = File::create(destination).map_err(extract_failed)?;
        io::copy(&mut source, &mut target).map_err(extract_failed)?;

        Ok(())
    }
}

/// Builds zip archives in memory for tests.
#[cfg(test)]
pub(crate) fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;

    let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}
