//! Runtime settings
//!
//! Defaults live here; the binary overrides them from command line flags and
//! environment variables.

use crate::catalog::DEFAULT_BASE_URL;
use crate::workspace::SettlePolicy;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// User agent the catalog expects from subtitle clients
pub const DEFAULT_USER_AGENT: &str = "Kodi-Addon";

/// Timeout applied to every HTTP request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while assembling the settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine cache directory location
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    /// The base URL is not an http(s) URL
    #[error("Invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Everything the search and download phases need to know about their
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the catalog site
    pub base_url: String,
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Directory archives are downloaded and extracted into
    pub workspace_dir: PathBuf,
    /// Readiness check for the downloaded archive
    pub settle: SettlePolicy,
}

impl Settings {
    /// Creates settings with all defaults, placing the workspace in the
    /// platform cache directory.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_workspace(default_workspace_dir()?))
    }

    /// Creates default settings using the given workspace directory.
    pub fn with_workspace(workspace_dir: PathBuf) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            workspace_dir,
            settle: SettlePolicy::default(),
        }
    }

    /// Replaces the catalog base URL after checking its scheme.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), ConfigError> {
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }

        self.base_url = trimmed.trim_end_matches('/').to_string();
        Ok(())
    }
}

/// Gets the default workspace directory
///
/// Returns the platform-specific cache directory path:
/// - Linux: ~/.cache/argenteam-subtitles/temp/
/// - macOS: ~/Library/Caches/net.argenteam.argenteam-subtitles/temp/
/// - Windows: %LOCALAPPDATA%\argenteam\argenteam-subtitles\cache\temp\
///
/// The directory is not created here; every download resets it anyway.
pub fn default_workspace_dir() -> Result<PathBuf, ConfigError> {
    let proj_dirs = directories::ProjectDirs::from("net", "argenteam", "argenteam-subtitles")
        .ok_or(ConfigError::CacheDirectoryNotFound)?;

    Ok(proj_dirs.cache_dir().join("temp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_workspace(PathBuf::from("/tmp/ws"));

        assert_eq!(settings.base_url, "http://argenteam.net");
        assert_eq!(settings.user_agent, "Kodi-Addon");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.workspace_dir, PathBuf::from("/tmp/ws"));
        assert_eq!(settings.settle, SettlePolicy::default());
    }

    #[test]
    fn test_set_base_url() {
        let mut settings = Settings::with_workspace(PathBuf::from("/tmp/ws"));

        settings.set_base_url("https://mirror.example/").unwrap();
        assert_eq!(settings.base_url, "https://mirror.example");

        assert!(matches!(
            settings.set_base_url("ftp://mirror.example"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert_eq!(settings.base_url, "https://mirror.example");
    }
}
