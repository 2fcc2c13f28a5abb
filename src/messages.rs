//! Request and response messages exchanged between the search and the
//! download phase.
//!
//! The two phases share no state: a search hands out opaque reference
//! strings, and a download is reconstructed from one of them.

use crate::player::PlayerMetadata;
use crate::query_builder::MediaIdentity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Value of the `action` parameter in every download reference
const DOWNLOAD_ACTION: &str = "download";

/// Errors that can occur while decoding a download reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// The reference names another action
    #[error("Reference is not a download action: {0}")]
    UnexpectedAction(String),

    /// A required parameter is missing or empty
    #[error("Reference is missing the '{0}' parameter")]
    MissingField(&'static str),

    /// A parameter value is not valid percent-encoded UTF-8
    #[error("Reference parameter '{0}' is not valid UTF-8")]
    InvalidEncoding(String),
}

/// Asks for the subtitles matching the playing media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// What the player knows about the media
    pub metadata: PlayerMetadata,
}

/// One entry of the list presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableItem {
    /// Two-digit, 1-based position in the ranked list
    pub index: String,
    /// Primary label (the language)
    pub label: String,
    /// Secondary label (the subtitle file name)
    pub label2: String,
    /// Popularity shown as rating
    pub rating: u64,
    /// Flag icon code
    pub language_code: String,
    /// Closed caption flag
    pub hearing_impaired: bool,
    /// Opaque reference that [`DownloadRequest::from_reference`] accepts
    pub reference: String,
}

/// The outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// How the media was identified
    pub identity: MediaIdentity,
    /// The query string sent to the catalog
    pub query: String,
    /// Ranked subtitles; empty when nothing was found
    pub items: Vec<SelectableItem>,
}

/// Everything needed to download one subtitle archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Catalog id of the subtitle
    pub catalog_id: String,
    /// URL of the archive
    pub retrieval_link: String,
    /// Name the archive is stored under (without `.zip`)
    pub target_filename: String,
    /// Keeps only extracted files whose path contains this text
    pub filter: Option<String>,
    /// Position of the chosen item in the search result list
    pub sort_order: Option<String>,
}

impl DownloadRequest {
    /// Encodes the request as an opaque reference string.
    pub fn to_reference(&self) -> String {
        let mut params = vec![("action", DOWNLOAD_ACTION.to_string())];
        if let Some(order) = &self.sort_order {
            params.push(("actionsortorder", order.clone()));
        }
        params.push(("link", self.retrieval_link.clone()));
        params.push(("filename", self.target_filename.clone()));
        params.push(("id", self.catalog_id.clone()));
        if let Some(filter) = &self.filter {
            params.push(("find", filter.clone()));
        }

        params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Decodes a reference produced by [`DownloadRequest::to_reference`].
    ///
    /// A leading `scheme://host/?` prefix is ignored, so full plugin URLs are
    /// accepted as well.
    pub fn from_reference(reference: &str) -> Result<Self, ReferenceError> {
        let query = reference
            .split_once('?')
            .map_or(reference, |(_, query)| query);

        let mut action = None;
        let mut sort_order = None;
        let mut link = None;
        let mut filename = None;
        let mut id = None;
        let mut filter = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let Some((key, raw_value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(raw_value)
                .map_err(|_| ReferenceError::InvalidEncoding(key.to_string()))?
                .into_owned();

            match key {
                "action" => action = Some(value),
                "actionsortorder" => sort_order = Some(value),
                "link" => link = Some(value),
                "filename" => filename = Some(value),
                "id" => id = Some(value),
                "find" => filter = Some(value),
                _ => {}
            }
        }

        match action.as_deref() {
            Some(DOWNLOAD_ACTION) => {}
            Some(other) => return Err(ReferenceError::UnexpectedAction(other.to_string())),
            None => return Err(ReferenceError::MissingField("action")),
        }

        let required = |value: Option<String>, name: &'static str| {
            value
                .filter(|v| !v.is_empty())
                .ok_or(ReferenceError::MissingField(name))
        };

        Ok(Self {
            catalog_id: required(id, "id")?,
            retrieval_link: required(link, "link")?,
            target_filename: required(filename, "filename")?,
            filter: filter.filter(|f| !f.is_empty()),
            sort_order,
        })
    }
}

/// The outcome of a download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResponse {
    /// Extracted subtitle files, in archive order
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DownloadRequest {
        DownloadRequest {
            catalog_id: "42".to_string(),
            retrieval_link: "http://www.argenteam.net/subtitles/42/My Movie & Co.srt".to_string(),
            target_filename: "My Movie & Co.srt".to_string(),
            filter: None,
            sort_order: Some("03".to_string()),
        }
    }

    #[test]
    fn test_reference_format() {
        assert_eq!(
            request().to_reference(),
            "action=download&actionsortorder=03\
             &link=http%3A%2F%2Fwww.argenteam.net%2Fsubtitles%2F42%2FMy%20Movie%20%26%20Co.srt\
             &filename=My%20Movie%20%26%20Co.srt&id=42"
        );
    }

    #[test]
    fn test_reference_survives_special_characters() {
        let mut original = request();
        original.filter = Some("cd1".to_string());

        let decoded = DownloadRequest::from_reference(&original.to_reference()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_plugin_url_prefix_is_ignored() {
        let decoded = DownloadRequest::from_reference(
            "plugin://service.subtitles.argenteam/?action=download&link=http%3A%2F%2Fx%2F1%2Fa.srt&filename=a.srt&id=1",
        )
        .unwrap();

        assert_eq!(decoded.catalog_id, "1");
        assert_eq!(decoded.retrieval_link, "http://x/1/a.srt");
        assert_eq!(decoded.filter, None);
        assert_eq!(decoded.sort_order, None);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            DownloadRequest::from_reference("action=download&filename=a.srt&id=1"),
            Err(ReferenceError::MissingField("link"))
        );
        assert_eq!(
            DownloadRequest::from_reference("link=x&filename=a.srt&id=1"),
            Err(ReferenceError::MissingField("action"))
        );
        assert_eq!(
            DownloadRequest::from_reference("action=search&link=x&filename=a.srt&id=1"),
            Err(ReferenceError::UnexpectedAction("search".to_string()))
        );
    }
}
