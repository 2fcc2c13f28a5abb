//! argenteam_subtitles - Find Spanish subtitles on argenteam.net
//!
//! This library identifies the media a player is showing, searches the
//! argenteam.net catalog for matching subtitles, ranks them, and unpacks the
//! archive of the one the user picks.
//!
//! The search and the download phase share no state. A search hands out
//! [`SelectableItem`]s whose opaque reference is all a later download needs.

mod archive;
mod candidate;
mod catalog;
mod config;
mod messages;
mod player;
mod query_builder;
mod ranker;
mod retriever;
mod title_cleaner;
mod workspace;

// Re-export error types
pub use archive::ArchiveError;
pub use catalog::CatalogError;
pub use config::ConfigError;
pub use messages::ReferenceError;
pub use retriever::RetrieveError;
pub use workspace::WorkspaceError;

pub use archive::{ArchiveBrowser, ZipBrowser};
pub use candidate::{CATALOG_LANGUAGE, CATALOG_LANGUAGE_CODE, Candidate};
pub use catalog::{
    CatalogClient, CatalogResult, CatalogTransport, DEFAULT_BASE_URL, FetchedPage, HttpTransport,
    expand_result, resolve, search_results,
};
pub use config::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, Settings, default_workspace_dir};
pub use messages::{
    DownloadRequest, DownloadResponse, SearchRequest, SearchResponse, SelectableItem,
};
pub use player::{PlayerMetadata, PlayingPath, normalize_string};
pub use query_builder::{IdentitySource, MediaIdentity, identify, identify_filename};
pub use ranker::{RankedCandidate, deduplicate, rank};
pub use retriever::{ArchiveRetriever, SUBTITLE_EXTENSIONS, is_subtitle};
pub use title_cleaner::{CleanedTitle, DefaultTitleCleaner, TitleCleaner};
pub use workspace::{SettlePolicy, Workspace, sanitize_filename, wait_until_ready};

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Progress event emitted while searching or downloading
///
/// These events allow library users to track progress and provide feedback
/// during both phases.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The playing media was identified
    Identified { mode: String, query: String },

    /// The catalog answered the search
    ResultsFound { count: usize },

    /// Expanding a single search hit into subtitles
    ExpandingResult {
        index: usize,
        total: usize,
        kind: String,
    },

    /// All hits were expanded; duplicates are already removed
    CandidatesCollected { count: usize },

    /// Search complete
    SearchComplete { item_count: usize },

    /// Emptying the workspace before a download
    ResettingWorkspace { path: PathBuf },

    /// Downloading a subtitle archive
    DownloadingArchive { url: String },

    /// The archive was written to the workspace
    ArchiveStored { path: PathBuf, size: u64 },

    /// Extracting the archive's files
    ExtractingArchive { entry_count: usize },

    /// A subtitle file was extracted
    SubtitleExtracted { path: PathBuf },

    /// Download complete
    DownloadComplete { file_count: usize },
}

/// Top-level error type for argenteam_subtitles operations
#[derive(Debug, Error)]
pub enum SubtitleServiceError {
    /// Error talking to the catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error during archive retrieval
    #[error("Retrieval error: {0}")]
    Retrieve(#[from] RetrieveError),

    /// Malformed download reference
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Error assembling the settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Searches the catalog for subtitles matching the playing media
///
/// The metadata is normalized, turned into a query, and the catalog hits are
/// expanded into individual subtitles, deduplicated and ranked by
/// popularity. A search never fails: unreachable or malformed catalog pages
/// only shrink the result, down to an empty list of items.
///
/// Progress events are emitted through the provided callback.
///
/// # Examples
///
/// ```no_run
/// use argenteam_subtitles::{
///     CatalogClient, DefaultTitleCleaner, HttpTransport, PlayerMetadata, ProgressEvent,
///     SearchRequest, search_subtitles,
/// };
/// use std::time::Duration;
///
/// let transport = HttpTransport::new("Kodi-Addon", Duration::from_secs(30)).unwrap();
/// let client = CatalogClient::new(transport, "http://argenteam.net");
///
/// let request = SearchRequest {
///     metadata: PlayerMetadata {
///         file_path: "/media/The.Wire.S01E02.720p.mkv".to_string(),
///         ..Default::default()
///     },
/// };
///
/// let response = search_subtitles(&client, &DefaultTitleCleaner, request, |event| {
///     if let ProgressEvent::Identified { mode, query } = event {
///         println!("Searching {} ({})", query, mode);
///     }
/// });
///
/// for item in response.items {
///     println!("{} {} [{}]", item.index, item.label2, item.rating);
/// }
/// ```
pub fn search_subtitles<T, F>(
    client: &CatalogClient<T>,
    cleaner: &dyn TitleCleaner,
    request: SearchRequest,
    mut progress_callback: F,
) -> SearchResponse
where
    T: CatalogTransport,
    F: FnMut(ProgressEvent),
{
    let metadata = request.metadata.normalized();
    if !metadata.languages.is_empty() {
        debug!(languages = ?metadata.languages, "Requested languages");
    }

    let identity = identify(&metadata, cleaner);
    let query = identity.query();
    info!(mode = identity.mode(), query = %query, "Searching catalog");
    progress_callback(ProgressEvent::Identified {
        mode: identity.mode().to_string(),
        query: query.clone(),
    });

    let results = search_results(client, &query);
    progress_callback(ProgressEvent::ResultsFound {
        count: results.len(),
    });

    let mut candidates = Vec::new();
    for (index, result) in results.iter().enumerate() {
        progress_callback(ProgressEvent::ExpandingResult {
            index,
            total: results.len(),
            kind: result.kind().to_string(),
        });
        candidates.extend(expand_result(client, result));
    }

    let candidates = deduplicate(candidates);
    progress_callback(ProgressEvent::CandidatesCollected {
        count: candidates.len(),
    });

    let items: Vec<SelectableItem> = rank(candidates).iter().map(|r| r.to_item()).collect();
    progress_callback(ProgressEvent::SearchComplete {
        item_count: items.len(),
    });

    SearchResponse {
        identity,
        query,
        items,
    }
}

/// Downloads and unpacks the subtitle archive described by `request`
///
/// The workspace is emptied first, so the returned paths are the only
/// subtitle files in it afterwards.
///
/// # Examples
///
/// ```no_run
/// use argenteam_subtitles::{
///     ArchiveRetriever, DownloadRequest, HttpTransport, ZipBrowser, download_subtitles,
/// };
/// use std::path::Path;
/// use std::time::Duration;
///
/// let transport = HttpTransport::new("Kodi-Addon", Duration::from_secs(30)).unwrap();
/// let retriever = ArchiveRetriever::new(transport, ZipBrowser, Path::new("/tmp/argenteam"));
///
/// let request = DownloadRequest::from_reference(
///     "action=download&link=http%3A%2F%2Fwww.argenteam.net%2Fsubtitles%2F42%2FMovie.srt\
///      &filename=Movie.srt&id=42",
/// )
/// .unwrap();
///
/// let response = download_subtitles(&retriever, &request, |_| {}).unwrap();
/// for file in response.files {
///     println!("{}", file.display());
/// }
/// ```
pub fn download_subtitles<T, B, F>(
    retriever: &ArchiveRetriever<T, B>,
    request: &DownloadRequest,
    mut progress_callback: F,
) -> Result<DownloadResponse, SubtitleServiceError>
where
    T: CatalogTransport,
    B: ArchiveBrowser,
    F: FnMut(ProgressEvent),
{
    let files = retriever.retrieve_with_progress(request, &mut progress_callback)?;

    progress_callback(ProgressEvent::DownloadComplete {
        file_count: files.len(),
    });

    Ok(DownloadResponse { files })
}

/// Like [`download_subtitles`], starting from a reference string handed out
/// by [`search_subtitles`].
pub fn download_reference<T, B, F>(
    retriever: &ArchiveRetriever<T, B>,
    reference: &str,
    progress_callback: F,
) -> Result<DownloadResponse, SubtitleServiceError>
where
    T: CatalogTransport,
    B: ArchiveBrowser,
    F: FnMut(ProgressEvent),
{
    let request = DownloadRequest::from_reference(reference)?;
    download_subtitles(retriever, &request, progress_callback)
}
