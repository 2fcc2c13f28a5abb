//! Title and year guessing from release file names.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Trailing year, preceded by at least one separator.
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*[^ _,.()\[\]-])[ _.()\[\]-]+((?:19|20)[0-9][0-9])(?:[ _,.()\[\]-]|[^0-9]$|$)")
        .expect("year pattern is valid")
});

/// Release tags that end the title part of a file name.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)[ _,.()\[\]-](ac3|dts|custom|dc|remastered|divx|divx5|dsr|dsrip|dutch|dvd|dvd5|dvd9|",
        r"dvdrip|dvdscr|dvdscreener|screener|dvdivx|cam|fragment|fs|hdtv|hdrip|hdtvrip|internal|",
        r"limited|multisubs|ntsc|ogg|ogm|pal|pdtv|proper|repack|rerip|retail|r3|r5|bd5|se|svcd|",
        r"swedish|german|read\.nfo|nfofix|unrated|extended|ws|telesync|ts|telecine|tc|brrip|bdrip|",
        r"480p|480i|576p|576i|720p|720i|1080p|1080i|2160p|3d|hrhd|hrhdtv|hddvd|bluray|web-dl|webrip|",
        r"x264|x265|h264|h265|hevc|xvid|xvidvd|cd[1-9]|\[.*\])(?:[ _,.()\[\]-]|$)"
    ))
    .expect("tag pattern is valid")
});

/// Extensions stripped before cleaning.
const MEDIA_EXTENSIONS: &[&str] = &[
    "avi", "mkv", "mp4", "m4v", "mov", "mpg", "mpeg", "ts", "wmv", "ogm", "iso", "rar",
];

/// A cleaned-up title with an optional year label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedTitle {
    /// Title words, separators replaced by spaces
    pub title: String,
    /// Four-digit year, when one was found
    pub year: Option<String>,
}

/// Guesses a human readable title (and year) from a raw file name.
pub trait TitleCleaner {
    /// Cleans `filename`, which may still carry its extension.
    fn clean(&self, filename: &str) -> CleanedTitle;
}

/// Scene-release aware cleaner.
///
/// Drops the extension, splits off a trailing year, cuts the name at the
/// first release tag and turns `.` and `_` into spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTitleCleaner;

impl TitleCleaner for DefaultTitleCleaner {
    fn clean(&self, filename: &str) -> CleanedTitle {
        let mut title = strip_media_extension(filename).to_string();
        let mut year = None;

        if let Some(caps) = YEAR_PATTERN.captures(&title) {
            year = Some(caps[2].to_string());
            title = caps[1].to_string();
        }

        if let Some(tag) = TAG_PATTERN.find(&title) {
            title.truncate(tag.start());
        }

        let title = title.replace(['.', '_'], " ").trim().to_string();

        CleanedTitle { title, year }
    }
}

fn strip_media_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => stem,
        _ => filename,
    }
}
