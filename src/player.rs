//! Metadata about the media currently playing.
//!
//! This is everything the media player knows about what the user is
//! watching; the query builder turns it into a catalog search.

use serde::{Deserialize, Serialize};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Player-supplied description of the playing media.
///
/// All labels are kept as the player reports them (strings, possibly empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMetadata {
    /// Path or URL of the playing file
    pub file_path: String,
    /// Display title
    pub title: String,
    /// Original title, preferred over `title` when present
    pub original_title: String,
    /// Title of the tv show, empty for movies
    pub tvshow_title: String,
    /// Release year label
    pub year: String,
    /// Season label
    pub season: String,
    /// Episode label; specials are reported like `S2`
    pub episode: String,
    /// Languages the user asked for
    pub languages: Vec<String>,
    /// Search string typed in by the user, if any
    pub manual_search: Option<String>,
}

/// Where the playing file lives, as far as the file name is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayingPath {
    /// A regular local file
    Local(String),
    /// A remote stream (`http://`, `https://`)
    Stream(String),
    /// A file inside a rar archive; holds the directory of the archive
    RarArchive(String),
    /// A stacked multi-part file; holds the first part
    Stack(String),
}

impl PlayingPath {
    /// Classifies a player path.
    pub fn classify(path: &str) -> Self {
        if path.starts_with("http://") || path.starts_with("https://") {
            PlayingPath::Stream(path.to_string())
        } else if let Some(inner) = path.strip_prefix("rar://") {
            let directory = Path::new(inner)
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            PlayingPath::RarArchive(directory)
        } else if let Some(stacked) = path.strip_prefix("stack://") {
            let first = stacked.split(" , ").next().unwrap_or_default();
            PlayingPath::Stack(first.to_string())
        } else {
            PlayingPath::Local(path.to_string())
        }
    }

    /// The path the media file name is taken from.
    pub fn effective_path(&self) -> &str {
        match self {
            PlayingPath::Local(p)
            | PlayingPath::Stream(p)
            | PlayingPath::RarArchive(p)
            | PlayingPath::Stack(p) => p,
        }
    }
}

impl PlayerMetadata {
    /// Brings the metadata into the shape the query builder expects.
    ///
    /// Titles are NFKD-normalized, the file path is percent-decoded, and an
    /// empty original title falls back to the display title.
    pub fn normalized(mut self) -> Self {
        self.title = normalize_string(&self.title);
        self.original_title = normalize_string(&self.original_title);
        self.tvshow_title = normalize_string(&self.tvshow_title);
        let decoded_path = urlencoding::decode(&self.file_path)
            .map(|decoded| decoded.into_owned())
            .ok();
        if let Some(path) = decoded_path {
            self.file_path = path;
        }
        if self.original_title.is_empty() {
            self.original_title = self.title.clone();
        }
        self
    }

    /// The title used for searching.
    pub fn search_title(&self) -> &str {
        if self.original_title.is_empty() {
            &self.title
        } else {
            &self.original_title
        }
    }

    /// Classification of the playing file's path.
    pub fn playing_path(&self) -> PlayingPath {
        PlayingPath::classify(&self.file_path)
    }

    /// The playing file's name without directory and extension.
    pub fn media_filename(&self) -> String {
        let playing = self.playing_path();
        Path::new(playing.effective_path())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Applies Unicode compatibility decomposition (NFKD).
pub fn normalize_string(value: &str) -> String {
    value.nfkd().collect()
}
