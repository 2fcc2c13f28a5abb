//! Catalog client for the argenteam.net API.
//!
//! Every endpoint returns `None` instead of an error: a failed request or a
//! payload that cannot be parsed is treated as "no data" for that one fetch.

use super::transport::{CatalogTransport, FetchedPage};
use super::types::{ReleaseDetail, SearchResponse, TvShowDetail};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Default catalog location
pub const DEFAULT_BASE_URL: &str = "http://argenteam.net";

/// Typed access to the catalog's query endpoints.
pub struct CatalogClient<T: CatalogTransport> {
    transport: T,
    base_url: String,
}

impl<T: CatalogTransport> CatalogClient<T> {
    /// Creates a client querying the catalog at `base_url`.
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The underlying transport, shared with the archive download.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs a free-text search.
    pub(crate) fn search(&self, query: &str) -> Option<SearchResponse> {
        let url = format!("{}/api/v1/search?q={}", self.base_url, quote_plus(query));
        let page = self.fetch(&url)?;
        parse(&page)
    }

    /// Fetches a show with its seasons and episode ids.
    pub(crate) fn tvshow(&self, id: u64) -> Option<TvShowDetail> {
        let url = format!("{}/api/v1/tvshow?id={}", self.base_url, id);
        let mut page = self.fetch(&url)?;
        page.body = blank_null_tokens(&page.body);
        parse(&page)
    }

    /// Fetches the releases of a single episode.
    pub(crate) fn episode(&self, id: u64) -> Option<ReleaseDetail> {
        let url = format!("{}/api/v1/episode?id={}", self.base_url, id);
        let page = self.fetch(&url)?;
        parse(&page)
    }

    /// Fetches the releases of a movie.
    pub(crate) fn movie(&self, id: u64) -> Option<ReleaseDetail> {
        let url = format!("{}/api/v1/movie?id={}", self.base_url, id);
        let page = self.fetch(&url)?;
        parse(&page)
    }

    fn fetch(&self, url: &str) -> Option<FetchedPage> {
        match self.transport.get_text(url) {
            Ok(page) => {
                debug!(url = %page.url, bytes = page.body.len(), "Fetched catalog page");
                Some(page)
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to get url");
                None
            }
        }
    }
}

fn parse<D: DeserializeOwned>(page: &FetchedPage) -> Option<D> {
    match serde_json::from_str(&page.body) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(url = %page.url, error = %e, "Unexpected catalog payload");
            None
        }
    }
}

/// Percent-encodes a query value, using `+` for spaces.
pub(crate) fn quote_plus(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Rewrites bare `null` tokens into empty strings.
///
/// The tvshow endpoint emits `null` for missing fields; only tokens outside
/// of string literals are touched.
pub(crate) fn blank_null_tokens(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let is_word = |b: Option<&u8>| b.is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_');

    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(b"null")
            && !is_word(bytes.get(i + 4))
            && (i == 0 || !is_word(bytes.get(i - 1)))
        {
            out.push_str(&raw[copied..i]);
            out.push_str("\"\"");
            i += 4;
            copied = i;
            continue;
        }

        i += 1;
    }

    out.push_str(&raw[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::transport::fake::FakeTransport;

    #[test]
    fn test_quote_plus() {
        assert_eq!(quote_plus("Lost S01E02"), "Lost+S01E02");
        assert_eq!(quote_plus("Movie Name+2019"), "Movie+Name%2B2019");
        assert_eq!(quote_plus("Amélie"), "Am%C3%A9lie");
    }

    #[test]
    fn test_blank_null_tokens() {
        assert_eq!(
            blank_null_tokens(r#"{"a": null, "b": [null,1], "c":null}"#),
            r#"{"a": "", "b": ["",1], "c":""}"#
        );
    }

    #[test]
    fn test_blank_null_tokens_keeps_strings() {
        let raw = r#"{"title": "null and void", "quote": "say \"null\"", "x": nullable}"#;
        assert_eq!(blank_null_tokens(raw), raw);
    }

    #[test]
    fn test_tvshow_with_nulls_parses() {
        let transport = FakeTransport::new().with_text(
            "http://catalog/api/v1/tvshow?id=9",
            r#"{"name": "Lost", "poster": null, "seasons": [{"number": 1, "episodes": [{"id": 1, "title": null}]}]}"#,
        );
        let client = CatalogClient::new(transport, "http://catalog/");

        let show = client.tvshow(9).unwrap();
        assert_eq!(show.seasons[0].episodes[0].id, 1);
    }

    #[test]
    fn test_transport_failure_is_empty_payload() {
        let client = CatalogClient::new(FakeTransport::new(), "http://catalog");

        assert!(client.search("anything").is_none());
        assert!(client.movie(1).is_none());
    }

    #[test]
    fn test_malformed_payload_is_empty_payload() {
        let transport =
            FakeTransport::new().with_text("http://catalog/api/v1/episode?id=3", "<html>oops</html>");
        let client = CatalogClient::new(transport, "http://catalog");

        assert!(client.episode(3).is_none());
    }

    #[test]
    fn test_search_url_is_encoded() {
        let transport = FakeTransport::new()
            .with_text("http://catalog/api/v1/search?q=The+Office+S01E02", r#"{"total": 0}"#);
        let client = CatalogClient::new(transport, "http://catalog");

        let response = client.search("The Office S01E02").unwrap();
        assert_eq!(response.total, 0);
    }
}
