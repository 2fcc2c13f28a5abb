//! Subtitle candidates presented to the user.

use crate::catalog::SubtitleEntry;
use serde::{Deserialize, Serialize};

/// Display language of every candidate; the catalog only serves Spanish.
pub const CATALOG_LANGUAGE: &str = "Spanish";

/// ISO 639-1 code matching [`CATALOG_LANGUAGE`], used as the flag icon.
pub const CATALOG_LANGUAGE_CODE: &str = "es";

/// Marker in a subtitle file name flagging closed captions.
const HEARING_IMPAIRED_MARKER: &str = "-CC";

/// A subtitle that can be offered to the user and downloaded later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Display language
    pub language: String,
    /// Short language code for the flag icon
    pub language_code: String,
    /// Subtitle file name, percent-decoded
    pub filename: String,
    /// Download count reported by the catalog
    pub popularity: u64,
    /// Whether the subtitle carries closed captions
    pub hearing_impaired: bool,
    /// Catalog id of the subtitle
    pub catalog_id: String,
    /// URL the subtitle archive is downloaded from
    pub retrieval_link: String,
}

impl Candidate {
    /// Derives a candidate from a raw catalog record.
    ///
    /// Returns `None` when the URI does not end in `<id>/<filename>`.
    pub(crate) fn from_entry(entry: &SubtitleEntry) -> Option<Self> {
        let mut segments = entry.uri.trim_end_matches('/').rsplit('/');
        let encoded_name = segments.next().filter(|s| !s.is_empty())?;
        let catalog_id = segments.next().filter(|s| !s.is_empty())?;

        let filename = unquote_plus(encoded_name);
        let hearing_impaired = filename.contains(HEARING_IMPAIRED_MARKER);

        Some(Self {
            language: CATALOG_LANGUAGE.to_string(),
            language_code: CATALOG_LANGUAGE_CODE.to_string(),
            filename,
            popularity: entry.count,
            hearing_impaired,
            catalog_id: catalog_id.to_string(),
            retrieval_link: entry.uri.clone(),
        })
    }
}

/// Percent-decodes a path segment, treating `+` as a space.
///
/// Invalid UTF-8 sequences leave the segment as it was.
fn unquote_plus(segment: &str) -> String {
    let spaced = segment.replace('+', " ");
    let decoded = urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .ok();
    decoded.unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uri: &str, count: u64) -> SubtitleEntry {
        SubtitleEntry {
            uri: uri.to_string(),
            count,
        }
    }

    #[test]
    fn test_closed_caption_candidate() {
        let candidate =
            Candidate::from_entry(&entry("http://www.argenteam.net/subtitles/42/My-Movie-CC.srt", 7))
                .unwrap();

        assert_eq!(candidate.catalog_id, "42");
        assert_eq!(candidate.filename, "My-Movie-CC.srt");
        assert!(candidate.hearing_impaired);
        assert_eq!(candidate.popularity, 7);
        assert_eq!(candidate.language, "Spanish");
        assert_eq!(candidate.language_code, "es");
        assert_eq!(
            candidate.retrieval_link,
            "http://www.argenteam.net/subtitles/42/My-Movie-CC.srt"
        );
    }

    #[test]
    fn test_filename_is_decoded() {
        let candidate = Candidate::from_entry(&entry(
            "http://www.argenteam.net/subtitles/77/Lost.%5B720p%5D+S01E02.srt",
            0,
        ))
        .unwrap();

        assert_eq!(candidate.filename, "Lost.[720p] S01E02.srt");
        assert_eq!(candidate.catalog_id, "77");
        assert!(!candidate.hearing_impaired);
    }

    #[test]
    fn test_uri_without_id_is_rejected() {
        assert!(Candidate::from_entry(&entry("file.srt", 1)).is_none());
        assert!(Candidate::from_entry(&entry("", 1)).is_none());
    }
}
