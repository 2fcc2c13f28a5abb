//! Download workspace management module
//!
//! Every download starts from an empty workspace directory. Unlike a
//! temporary file, the workspace is not removed afterwards: the extracted
//! subtitles are handed to the player from there. It is wiped the next time
//! a download begins.

use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while preparing or writing to the workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Failed to remove the previous workspace
    #[error("Failed to clear workspace {path}: {source}")]
    ClearFailed { path: PathBuf, source: io::Error },

    /// Failed to create the workspace directory
    #[error("Failed to create workspace {path}: {source}")]
    CreateFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file into the workspace
    #[error("Failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// A written file never became visible with its full content
    #[error("File {path} not ready after {attempts} checks")]
    NotReady { path: PathBuf, attempts: u32 },
}

/// How long to wait for a freshly written file to become readable.
///
/// Checks start immediately and back off exponentially between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Pause after the first failed check
    pub initial_delay: Duration,
    /// Number of checks before giving up
    pub max_attempts: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(25),
            max_attempts: 6,
        }
    }
}

/// A freshly emptied directory owned by the current download
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Empties `root` (removing it if present) and recreates it.
    ///
    /// Whatever a previous download left behind, including after a failure,
    /// is gone afterwards.
    pub fn reset(root: &Path) -> Result<Self, WorkspaceError> {
        if root.exists() {
            fs::remove_dir_all(root).map_err(|e| WorkspaceError::ClearFailed {
                path: root.to_path_buf(),
                source: e,
            })?;
        }

        fs::create_dir_all(root).map_err(|e| WorkspaceError::CreateFailed {
            path: root.to_path_buf(),
            source: e,
        })?;

        debug!(path = %root.display(), "Workspace reset");

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Get the path of the workspace directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes `content` to `file_name` inside the workspace.
    ///
    /// The name is sanitized so it cannot leave the workspace.
    pub fn write_file(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, WorkspaceError> {
        let path = self.root.join(sanitize_filename(file_name));

        fs::write(&path, content).map_err(|e| WorkspaceError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }
}

impl Deref for Workspace {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}

/// Waits until `path` exists and holds exactly `expected_len` bytes.
pub fn wait_until_ready(
    path: &Path,
    expected_len: u64,
    policy: &SettlePolicy,
) -> Result<(), WorkspaceError> {
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_attempts {
        match fs::metadata(path) {
            Ok(metadata) if metadata.len() == expected_len => return Ok(()),
            _ if attempt == policy.max_attempts => break,
            _ => {
                debug!(path = %path.display(), attempt, "File not settled yet");
                thread::sleep(delay);
                delay *= 2;
            }
        }
    }

    Err(WorkspaceError::NotReady {
        path: path.to_path_buf(),
        attempts: policy.max_attempts,
    })
}

/// Turns a catalog-supplied name into a single file name inside the workspace.
///
/// Separators and characters reserved on common platforms become `-`, so the
/// name can neither address a subdirectory nor climb out of the workspace.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        "subtitle".to_string()
    } else {
        trimmed.to_string()
    }
}
