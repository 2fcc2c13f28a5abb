//! Turns player metadata into a catalog search query.
//!
//! The identity is chosen in order of confidence: a manual search string,
//! then a tv episode, then a movie title and year, and finally whatever can
//! be recovered from the file name.

use crate::player::PlayerMetadata;
use crate::title_cleaner::TitleCleaner;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// `S01E02` style episode marker following a non-word character.
static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\WS(\d\d)E(\d\d)").expect("episode marker pattern is valid")
});

/// Years up to this one are not taken seriously when guessed from a file name.
const MIN_PLAUSIBLE_YEAR: u32 = 1900;

/// Where a movie title and year came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentitySource {
    /// Reported by the player
    Player,
    /// Guessed from the file name
    Filename,
}

/// What to search the catalog for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaIdentity {
    /// A search string typed in by the user, used verbatim
    ManualString { query: String },
    /// A single episode of a tv show
    TvEpisode {
        show: String,
        season: u32,
        episode: u32,
    },
    /// A movie identified by title and year
    MovieTitleYear {
        title: String,
        year: String,
        source: IdentitySource,
    },
    /// Nothing better was found; the raw file name is the query
    FilenameFallback { filename: String },
}

impl MediaIdentity {
    /// Name of the identification mode, for logs and display.
    pub fn mode(&self) -> &'static str {
        match self {
            MediaIdentity::ManualString { .. } => "manual-string",
            MediaIdentity::TvEpisode { .. } => "tv-episode",
            MediaIdentity::MovieTitleYear { .. } => "movie-title-year",
            MediaIdentity::FilenameFallback { .. } => "filename-fallback",
        }
    }

    /// The query string sent to the catalog's search endpoint.
    pub fn query(&self) -> String {
        match self {
            MediaIdentity::ManualString { query } => query.clone(),
            MediaIdentity::TvEpisode {
                show,
                season,
                episode,
            } => format!("{} S{:02}E{:02}", show, season, episode),
            MediaIdentity::MovieTitleYear {
                title,
                year,
                source: IdentitySource::Player,
            } => format!("{} {}", title, year),
            MediaIdentity::MovieTitleYear {
                title,
                year,
                source: IdentitySource::Filename,
            } => format!("{}+{}", title, year),
            MediaIdentity::FilenameFallback { filename } => filename.clone(),
        }
    }
}

impl fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.mode(), self.query())
    }
}

/// Builds the identity for a search from (normalized) player metadata.
///
/// Never fails: anything that cannot be understood degrades to a search for
/// the raw file name.
pub fn identify(metadata: &PlayerMetadata, cleaner: &dyn TitleCleaner) -> MediaIdentity {
    if let Some(manual) = metadata.manual_search.as_deref().filter(|s| !s.is_empty()) {
        let query = urlencoding::decode(manual)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| manual.to_string());
        return MediaIdentity::ManualString { query };
    }

    if !metadata.tvshow_title.is_empty() {
        if let Some((season, episode)) = episode_numbers(&metadata.season, &metadata.episode) {
            return tv_episode(&metadata.tvshow_title, season, episode);
        }
        debug!(
            season = %metadata.season,
            episode = %metadata.episode,
            "Unusable season/episode labels, not searching as tv episode"
        );
    }

    let title = metadata.search_title();
    if !title.is_empty() && !metadata.year.is_empty() {
        return MediaIdentity::MovieTitleYear {
            title: title.to_string(),
            year: metadata.year.clone(),
            source: IdentitySource::Player,
        };
    }

    identify_filename(&metadata.media_filename(), cleaner)
}

/// Builds the identity for a search from a bare file name.
pub fn identify_filename(filename: &str, cleaner: &dyn TitleCleaner) -> MediaIdentity {
    let cleaned = cleaner.clean(filename);
    debug!(title = %cleaned.title, year = ?cleaned.year, "Cleaned file name");

    if let Some(year) = cleaned.year.as_deref() {
        let plausible = year.trim().parse::<u32>().is_ok_and(|y| y > MIN_PLAUSIBLE_YEAR);
        if plausible && !cleaned.title.is_empty() {
            return MediaIdentity::MovieTitleYear {
                title: cleaned.title,
                year: year.to_string(),
                source: IdentitySource::Filename,
            };
        }
    }

    if let Some(caps) = EPISODE_MARKER.captures(&cleaned.title) {
        let marker = caps.get(0).map_or(0, |m| m.start());
        let show = cleaned.title[..marker].trim();
        let season = caps[1].trim_start_matches('0').parse::<u32>().unwrap_or(0);
        let episode = caps[2].trim_start_matches('0').parse::<u32>().unwrap_or(0);

        if !show.is_empty() {
            return tv_episode(show, season, episode);
        }
    }

    MediaIdentity::FilenameFallback {
        filename: filename.to_string(),
    }
}

fn tv_episode(show: &str, season: u32, episode: u32) -> MediaIdentity {
    MediaIdentity::TvEpisode {
        show: show.replace("(US)", "").trim().to_string(),
        season,
        episode,
    }
}

/// Parses the player's season and episode labels.
///
/// A non-numeric episode label containing an `s` marks a special: the season
/// becomes 0 and the episode is the label's last character.
fn episode_numbers(season: &str, episode: &str) -> Option<(u32, u32)> {
    let season = season.trim();
    let episode = episode.trim();

    if episode.parse::<u32>().is_err() && episode.to_lowercase().contains('s') {
        let last = episode.chars().last()?;
        return Some((0, last.to_digit(10)?));
    }

    Some((season.parse().ok()?, episode.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::title_cleaner::DefaultTitleCleaner;

    fn tv_metadata(show: &str, season: &str, episode: &str) -> PlayerMetadata {
        PlayerMetadata {
            file_path: "/media/whatever.mkv".to_string(),
            tvshow_title: show.to_string(),
            season: season.to_string(),
            episode: episode.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tv_episode_query() {
        let identity = identify(&tv_metadata("Lost", "1", "2"), &DefaultTitleCleaner);

        assert_eq!(identity.mode(), "tv-episode");
        assert_eq!(identity.query(), "Lost S01E02");
    }

    #[test]
    fn test_tv_episode_query_padding() {
        for (season, episode, expected) in [
            (0, 0, "Show S00E00"),
            (3, 14, "Show S03E14"),
            (12, 101, "Show S12E101"),
        ] {
            let identity = identify(
                &tv_metadata("Show", &season.to_string(), &episode.to_string()),
                &DefaultTitleCleaner,
            );
            assert_eq!(identity.query(), expected);
        }
    }

    #[test]
    fn test_us_suffix_is_stripped() {
        let identity = identify(&tv_metadata("The Office (US)", "2", "1"), &DefaultTitleCleaner);

        assert_eq!(
            identity,
            MediaIdentity::TvEpisode {
                show: "The Office".to_string(),
                season: 2,
                episode: 1,
            }
        );
        assert_eq!(identity.query(), "The Office S02E01");
    }

    #[test]
    fn test_special_episode() {
        let identity = identify(&tv_metadata("Doctor Who", "4", "S3"), &DefaultTitleCleaner);

        assert_eq!(identity.query(), "Doctor Who S00E03");
    }

    #[test]
    fn test_manual_search_wins() {
        let metadata = PlayerMetadata {
            manual_search: Some("the%20wire".to_string()),
            ..tv_metadata("Lost", "1", "2")
        };

        assert_eq!(
            identify(&metadata, &DefaultTitleCleaner),
            MediaIdentity::ManualString {
                query: "the wire".to_string()
            }
        );
    }

    #[test]
    fn test_movie_from_player() {
        let metadata = PlayerMetadata {
            title: "Nueve reinas".to_string(),
            year: "2000".to_string(),
            ..Default::default()
        };

        let identity = identify(&metadata, &DefaultTitleCleaner);
        assert_eq!(identity.mode(), "movie-title-year");
        assert_eq!(identity.query(), "Nueve reinas 2000");
    }

    #[test]
    fn test_episode_from_filename() {
        let identity = identify_filename("Show.Name.S01E05.1080p.mkv", &DefaultTitleCleaner);

        assert_eq!(
            identity,
            MediaIdentity::TvEpisode {
                show: "Show Name".to_string(),
                season: 1,
                episode: 5,
            }
        );
        assert_eq!(identity.query(), "Show Name S01E05");
    }

    #[test]
    fn test_movie_from_filename() {
        let identity = identify_filename("Movie.Name.2019.1080p.mkv", &DefaultTitleCleaner);

        assert_eq!(identity.mode(), "movie-title-year");
        assert_eq!(identity.query(), "Movie Name+2019");
    }

    #[test]
    fn test_filename_fallback() {
        let identity = identify_filename("VID_0042", &DefaultTitleCleaner);

        assert_eq!(
            identity,
            MediaIdentity::FilenameFallback {
                filename: "VID_0042".to_string()
            }
        );
    }

    #[test]
    fn test_unusable_labels_fall_through_to_filename() {
        let metadata = PlayerMetadata {
            file_path: "/media/Show.Name.S02E07.720p.mkv".to_string(),
            tvshow_title: "Show Name".to_string(),
            season: String::new(),
            episode: String::new(),
            ..Default::default()
        };

        assert_eq!(identify(&metadata, &DefaultTitleCleaner).query(), "Show Name S02E07");
    }

    #[test]
    fn test_implausible_year_is_ignored() {
        struct OldYear;
        impl TitleCleaner for OldYear {
            fn clean(&self, _filename: &str) -> crate::title_cleaner::CleanedTitle {
                crate::title_cleaner::CleanedTitle {
                    title: "Nosferatu".to_string(),
                    year: Some("1899".to_string()),
                }
            }
        }

        assert_eq!(
            identify_filename("nosferatu", &OldYear).mode(),
            "filename-fallback"
        );
    }
}
