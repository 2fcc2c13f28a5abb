//! Argenteam API response types for deserialization.
//!
//! These structures mirror the JSON response format of the `/api/v1` endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// The top-level response from the search endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    /// Total number of hits reported by the catalog
    #[serde(default)]
    pub total: u64,
    /// The hits themselves (may be absent when `total` is zero)
    #[serde(default, deserialize_with = "lenient_list")]
    pub results: Vec<CatalogResult>,
}

/// A single hit from the search endpoint, discriminated by its `type` field.
///
/// A `TvShow` has to be expanded (show, seasons, episodes) before it yields
/// subtitles; `Episode` and `Movie` point directly at a detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogResult {
    /// A whole tv show
    #[serde(rename = "tvshow")]
    TvShow { id: u64 },
    /// A single episode of a show
    Episode { id: u64 },
    /// A movie
    Movie { id: u64 },
    /// Any kind the catalog may add in the future
    #[serde(other)]
    Unsupported,
}

impl CatalogResult {
    /// Short name of the result kind, as used by the catalog.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogResult::TvShow { .. } => "tvshow",
            CatalogResult::Episode { .. } => "episode",
            CatalogResult::Movie { .. } => "movie",
            CatalogResult::Unsupported => "unsupported",
        }
    }
}

/// The response from the tvshow endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TvShowDetail {
    #[serde(default, deserialize_with = "lenient_list")]
    pub seasons: Vec<SeasonDetail>,
}

/// A season inside a tvshow response.
#[derive(Debug, Deserialize)]
pub(crate) struct SeasonDetail {
    #[serde(default, deserialize_with = "lenient_list")]
    pub episodes: Vec<EpisodeRef>,
}

/// An episode reference inside a season; only the id is needed to fetch it.
#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeRef {
    pub id: u64,
}

/// The response from the episode and movie endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseDetail {
    /// Releases of this episode or movie; absent when nothing was released
    #[serde(default, deserialize_with = "lenient_list")]
    pub releases: Vec<Release>,
}

/// A release groups the subtitles uploaded for one video release.
#[derive(Debug, Deserialize)]
pub(crate) struct Release {
    #[serde(default, deserialize_with = "lenient_list")]
    pub subtitles: Vec<SubtitleEntry>,
}

/// A raw subtitle record.
///
/// The last two path segments of `uri` are the numeric subtitle id and the
/// (percent-encoded) file name.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubtitleEntry {
    pub uri: String,
    /// Download count, the only popularity signal the catalog offers
    #[serde(default, deserialize_with = "null_as_zero")]
    pub count: u64,
}

/// Reads a list element by element, skipping elements that do not parse.
///
/// Anything that is not a list (`null`, or the blank string a sanitized
/// `null` turned into) reads as an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(error = %e, "Skipping malformed catalog record");
                None
            }
        })
        .collect())
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_kinds() {
        let json = r#"{"total": 4, "results": [
            {"id": 1, "type": "tvshow", "title": "Lost"},
            {"id": 2, "type": "episode"},
            {"id": 3, "type": "movie"},
            {"id": 4, "type": "person"}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.total, 4);
        assert_eq!(
            response.results,
            vec![
                CatalogResult::TvShow { id: 1 },
                CatalogResult::Episode { id: 2 },
                CatalogResult::Movie { id: 3 },
                CatalogResult::Unsupported,
            ]
        );
    }

    #[test]
    fn test_zero_total_without_results() {
        let response: SearchResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert_eq!(response.total, 0);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_tvshow_blank_lists() {
        let json = r#"{"seasons": [{"episodes": ""}, {"episodes": [{"id": 7}]}], "poster": ""}"#;
        let detail: TvShowDetail = serde_json::from_str(json).unwrap();

        assert_eq!(detail.seasons.len(), 2);
        assert!(detail.seasons[0].episodes.is_empty());
        assert_eq!(detail.seasons[1].episodes[0].id, 7);
    }

    #[test]
    fn test_release_detail_without_releases() {
        let detail: ReleaseDetail = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert!(detail.releases.is_empty());
    }

    #[test]
    fn test_malformed_elements_are_skipped() {
        let json = r#"{"releases": [
            {"subtitles": [
                {"uri": "http://x/subtitles/1/a.srt", "count": 5},
                {"count": 3},
                {"uri": "http://x/subtitles/2/b.srt", "count": null}
            ]},
            "not a release",
            {"subtitles": null}
        ]}"#;
        let detail: ReleaseDetail = serde_json::from_str(json).unwrap();

        assert_eq!(detail.releases.len(), 2);
        let subtitles = &detail.releases[0].subtitles;
        assert_eq!(subtitles.len(), 2);
        assert_eq!(subtitles[0].count, 5);
        assert_eq!(subtitles[1].uri, "http://x/subtitles/2/b.srt");
        assert_eq!(subtitles[1].count, 0);
        assert!(detail.releases[1].subtitles.is_empty());
    }

    #[test]
    fn test_episode_without_id_is_skipped() {
        let json = r#"{"seasons": [{"episodes": [{"id": 1}, {"id": null}, {"id": ""}, {"id": 4}]}]}"#;
        let detail: TvShowDetail = serde_json::from_str(json).unwrap();

        let ids: Vec<u64> = detail.seasons[0].episodes.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
