/// Access to the argenteam.net subtitle catalog.
///
/// This module holds the HTTP transport, the typed client for the catalog's
/// query endpoints, and the resolver that walks search hits down to the
/// individual subtitle records.
mod client;
mod resolver;
mod transport;
mod types;

pub use client::{CatalogClient, DEFAULT_BASE_URL};
pub use resolver::{expand_result, resolve, search_results};
pub use transport::{CatalogTransport, FetchedPage, HttpTransport};
pub use types::CatalogResult;

pub(crate) use types::SubtitleEntry;

#[cfg(test)]
pub(crate) use transport::fake::FakeTransport;

use thiserror::Error;

/// Errors that can occur while talking to the catalog.
///
/// Search and resolve swallow these (a failed fetch is "no data"); they only
/// reach the caller when an archive download fails.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request could not be sent or the body could not be read
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },
}

impl<T: CatalogTransport + ?Sized> CatalogTransport for &T {
    fn get_text(&self, url: &str) -> Result<FetchedPage, CatalogError> {
        (**self).get_text(url)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        (**self).get_bytes(url)
    }
}
