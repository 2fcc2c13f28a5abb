//! Archive retrieval module
//!
//! Downloads the archive of a chosen subtitle into a freshly reset workspace,
//! extracts it, and picks out the subtitle files.

use crate::ProgressEvent;
use crate::archive::{ArchiveBrowser, ArchiveError};
use crate::catalog::{CatalogError, CatalogTransport};
use crate::messages::DownloadRequest;
use crate::workspace::{self, SettlePolicy, Workspace, WorkspaceError};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// File extensions recognized as subtitles
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "txt", "smi", "ssa", "ass"];

/// Errors that can occur while retrieving a subtitle archive
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The workspace could not be prepared or written to
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// The archive could not be downloaded
    #[error("Download failed: {0}")]
    Download(#[from] CatalogError),

    /// The downloaded file is not a zip archive
    #[error("Downloaded file is not a zip archive: {0}")]
    NotAnArchive(PathBuf),

    /// The archive could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Fetches and unpacks subtitle archives.
pub struct ArchiveRetriever<T: CatalogTransport, B: ArchiveBrowser> {
    transport: T,
    browser: B,
    workspace_dir: PathBuf,
    settle: SettlePolicy,
}

impl<T: CatalogTransport, B: ArchiveBrowser> ArchiveRetriever<T, B> {
    /// Creates a retriever extracting into `workspace_dir`.
    ///
    /// The directory is wiped at the start of every retrieval.
    pub fn new(transport: T, browser: B, workspace_dir: &Path) -> Self {
        Self {
            transport,
            browser,
            workspace_dir: workspace_dir.to_path_buf(),
            settle: SettlePolicy::default(),
        }
    }

    /// Overrides how long to wait for the stored archive to settle.
    pub fn with_settle_policy(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// The directory subtitles are extracted into.
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Retrieves the archive for `request` and returns its subtitle files.
    pub fn retrieve(&self, request: &DownloadRequest) -> Result<Vec<PathBuf>, RetrieveError> {
        self.retrieve_with_progress(request, |_| {})
    }

    /// Like [`retrieve`](Self::retrieve), reporting progress events.
    ///
    /// Subtitle files are returned in archive order. With a filter, only
    /// files whose path inside the archive contains it (ignoring case) are
    /// returned; all files are extracted either way. An archive without any
    /// subtitle file yields an empty list.
    pub fn retrieve_with_progress<F>(
        &self,
        request: &DownloadRequest,
        mut progress_callback: F,
    ) -> Result<Vec<PathBuf>, RetrieveError>
    where
        F: FnMut(ProgressEvent),
    {
        progress_callback(ProgressEvent::ResettingWorkspace {
            path: self.workspace_dir.clone(),
        });
        let workspace = Workspace::reset(&self.workspace_dir)?;

        progress_callback(ProgressEvent::DownloadingArchive {
            url: request.retrieval_link.clone(),
        });
        let content = self.transport.get_bytes(&request.retrieval_link)?;

        let archive_path =
            workspace.write_file(&format!("{}.zip", request.target_filename), &content)?;
        workspace::wait_until_ready(&archive_path, content.len() as u64, &self.settle)?;
        progress_callback(ProgressEvent::ArchiveStored {
            path: archive_path.clone(),
            size: content.len() as u64,
        });

        if !infer::archive::is_zip(&content) {
            return Err(RetrieveError::NotAnArchive(archive_path));
        }

        let entries = self.browser.list_files(&archive_path)?;
        progress_callback(ProgressEvent::ExtractingArchive {
            entry_count: entries.len(),
        });

        let filter = request
            .filter
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        let mut subtitles = Vec::new();
        for entry in entries {
            let Some(destination) = enclosed_destination(&workspace, &entry) else {
                warn!(entry = %entry, "Skipping archive entry with unsafe path");
                continue;
            };
            if destination == archive_path {
                warn!(entry = %entry, "Skipping archive entry named like the archive itself");
                continue;
            }
            if let Err(e) = self.browser.copy_entry(&archive_path, &entry, &destination) {
                warn!(entry = %entry, error = %e, "Failed to extract archive entry");
                continue;
            }

            if !is_subtitle(&entry) {
                continue;
            }

            if let Some(filter) = &filter {
                if !entry.to_lowercase().contains(filter.as_str()) {
                    continue;
                }
            }

            info!(path = %destination.display(), "Returning subtitle file");
            progress_callback(ProgressEvent::SubtitleExtracted {
                path: destination.clone(),
            });
            subtitles.push(destination);
        }

        Ok(subtitles)
    }
}

/// Where `entry` is extracted to, or `None` when it would leave `root`.
///
/// Only plain relative names are accepted: no root, prefix, `.` or `..`.
fn enclosed_destination(root: &Path, entry: &str) -> Option<PathBuf> {
    let relative = Path::new(entry);
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    (plain && relative.components().next().is_some()).then(|| root.join(relative))
}

/// Whether `name` carries one of the recognized subtitle extensions.
pub fn is_subtitle(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUBTITLE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
