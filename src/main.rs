use argenteam_subtitles::{
    ArchiveRetriever, CatalogClient, DefaultTitleCleaner, DownloadRequest, HttpTransport,
    PlayerMetadata, ProgressEvent, SearchRequest, SearchResponse, Settings, SubtitleServiceError,
    ZipBrowser, download_subtitles, search_subtitles,
};
use clap::{Args, Parser, Subcommand};
use dialoguer::Select;
use humansize::{DECIMAL, format_size};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root URL of the subtitle catalog
    #[arg(long, global = true, env = "ARGENTEAM_BASE_URL")]
    base_url: Option<String>,

    /// User agent sent with every request
    #[arg(long, global = true, env = "ARGENTEAM_USER_AGENT")]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Directory archives are downloaded and extracted into
    #[arg(long, global = true, env = "ARGENTEAM_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Print debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search subtitles and print the ranked list with download references
    Search(MediaArgs),

    /// Download the subtitles behind a reference printed by `search`
    Download {
        /// Reference string of the chosen subtitle
        #[arg(long)]
        reference: String,

        /// Only keep extracted files whose name contains this text
        #[arg(long)]
        find: Option<String>,
    },

    /// Search, pick a subtitle interactively and download it
    Fetch {
        #[command(flatten)]
        media: MediaArgs,

        /// Only keep extracted files whose name contains this text
        #[arg(long)]
        find: Option<String>,
    },
}

/// What the player would report about the playing media
#[derive(Args, Debug)]
struct MediaArgs {
    /// Path or URL of the playing file
    #[arg(long, default_value = "")]
    file: String,

    /// Display title
    #[arg(long, default_value = "")]
    title: String,

    /// Original title
    #[arg(long, default_value = "")]
    original_title: String,

    /// Release year
    #[arg(long, default_value = "")]
    year: String,

    /// Tv show title
    #[arg(long, default_value = "")]
    show: String,

    /// Season number
    #[arg(long, default_value = "")]
    season: String,

    /// Episode number
    #[arg(long, default_value = "")]
    episode: String,

    /// Manual search string, used verbatim
    #[arg(long)]
    query: Option<String>,

    /// Requested subtitle languages
    #[arg(long = "language")]
    languages: Vec<String>,
}

impl From<MediaArgs> for SearchRequest {
    fn from(args: MediaArgs) -> Self {
        SearchRequest {
            metadata: PlayerMetadata {
                file_path: args.file,
                title: args.title,
                original_title: args.original_title,
                tvshow_title: args.show,
                year: args.year,
                season: args.season,
                episode: args.episode,
                languages: args.languages,
                manual_search: args.query,
            },
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Service(#[from] SubtitleServiceError),

    #[error("Selection failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl From<argenteam_subtitles::ConfigError> for CliError {
    fn from(e: argenteam_subtitles::ConfigError) -> Self {
        CliError::Service(e.into())
    }
}

impl From<argenteam_subtitles::CatalogError> for CliError {
    fn from(e: argenteam_subtitles::CatalogError) -> Self {
        CliError::Service(e.into())
    }
}

impl From<argenteam_subtitles::ReferenceError> for CliError {
    fn from(e: argenteam_subtitles::ReferenceError) -> Self {
        CliError::Service(e.into())
    }
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Identified { mode, query } => {
            println!("Searching argenteam for '{}' ({})...", query, mode);
        }
        ProgressEvent::ResultsFound { count } => {
            if count == 0 {
                println!("No matches in the catalog.");
            } else {
                println!("Found {} catalog match(es)", count);
            }
        }
        ProgressEvent::ExpandingResult { index, total, kind } => {
            println!("[{}/{}] Collecting subtitles of {}...", index + 1, total, kind);
        }
        ProgressEvent::CandidatesCollected { count } => {
            println!("Collected {} subtitle(s)\n", count);
        }
        ProgressEvent::SearchComplete { .. } => {}
        ProgressEvent::ResettingWorkspace { path } => {
            println!("\nPreparing workspace {}...", path.display());
        }
        ProgressEvent::DownloadingArchive { url } => {
            println!("Downloading {}...", url);
        }
        ProgressEvent::ArchiveStored { path, size } => {
            println!(
                "  Stored {} ({})",
                path.display(),
                format_size(size, DECIMAL)
            );
        }
        ProgressEvent::ExtractingArchive { entry_count } => {
            println!("  Extracting {} file(s)...", entry_count);
        }
        ProgressEvent::SubtitleExtracted { path } => {
            println!("  Subtitle: {}", path.display());
        }
        ProgressEvent::DownloadComplete { file_count } => {
            println!("\nDownload complete! {} subtitle file(s) ready.", file_count);
        }
    }
}

fn build_settings(cli: &Cli) -> Result<Settings, CliError> {
    let mut settings = match &cli.workspace {
        Some(workspace) => Settings::with_workspace(workspace.clone()),
        None => Settings::new()?,
    };

    if let Some(base_url) = &cli.base_url {
        settings.set_base_url(base_url)?;
    }
    if let Some(user_agent) = &cli.user_agent {
        settings.user_agent = user_agent.clone();
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout = Duration::from_secs(timeout);
    }

    Ok(settings)
}

fn print_items(response: &SearchResponse) {
    println!("\n=== Subtitles for {} ===\n", response.identity);

    if response.items.is_empty() {
        println!("No subtitles found.");
        return;
    }

    for item in &response.items {
        let cc = if item.hearing_impaired { " [CC]" } else { "" };
        println!(
            "{}  {} ({})  {}{}  downloads: {}",
            item.index, item.label, item.language_code, item.label2, cc, item.rating
        );
        println!("    reference: {}", item.reference);
    }
}

fn print_files(files: &[PathBuf]) {
    if files.is_empty() {
        println!("The archive contained no subtitle files.");
        return;
    }

    for file in files {
        println!("{}", file.display());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = build_settings(&cli)?;

    let transport = HttpTransport::new(&settings.user_agent, settings.timeout)?;
    let client = CatalogClient::new(&transport, &settings.base_url);
    let retriever = ArchiveRetriever::new(&transport, ZipBrowser, &settings.workspace_dir)
        .with_settle_policy(settings.settle);

    match cli.command {
        Command::Search(media) => {
            let response = search_subtitles(
                &client,
                &DefaultTitleCleaner,
                media.into(),
                handle_progress_event,
            );
            print_items(&response);
        }
        Command::Download { reference, find } => {
            let mut request = DownloadRequest::from_reference(&reference)?;
            if find.is_some() {
                request.filter = find;
            }
            let response = download_subtitles(&retriever, &request, handle_progress_event)?;
            print_files(&response.files);
        }
        Command::Fetch { media, find } => {
            let response = search_subtitles(
                &client,
                &DefaultTitleCleaner,
                media.into(),
                handle_progress_event,
            );

            if response.items.is_empty() {
                println!("No subtitles found for {}.", response.identity);
                return Ok(());
            }

            let labels: Vec<String> = response
                .items
                .iter()
                .map(|item| {
                    let cc = if item.hearing_impaired { " [CC]" } else { "" };
                    format!("{}{}  ({} downloads)", item.label2, cc, item.rating)
                })
                .collect();

            let Some(choice) = Select::new()
                .with_prompt("Choose a subtitle")
                .items(&labels)
                .default(0)
                .interact_opt()?
            else {
                println!("Nothing selected.");
                return Ok(());
            };

            let mut request = DownloadRequest::from_reference(&response.items[choice].reference)?;
            request.filter = find;
            let response = download_subtitles(&retriever, &request, handle_progress_event)?;
            print_files(&response.files);
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with printed references
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
