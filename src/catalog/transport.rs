//! HTTP transport for the catalog API and the archive downloads.

use super::CatalogError;
use std::time::Duration;
use tracing::debug;

/// A fetched text document together with the URL it was finally served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// The response body
    pub body: String,
    /// The URL after redirects
    pub url: String,
}

/// Raw access to the catalog over HTTP.
///
/// Implementors only move bytes; interpreting them is left to the
/// [`CatalogClient`](super::CatalogClient) and the archive retriever.
pub trait CatalogTransport {
    /// Fetches a text document with a GET request.
    fn get_text(&self, url: &str) -> Result<FetchedPage, CatalogError>;

    /// Fetches a binary document (a subtitle archive) with a GET request.
    ///
    /// Non-2xx responses are errors.
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError>;
}

/// Blocking `reqwest` transport that identifies itself with a user agent.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport sending `user_agent` on every request.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        Ok(Self { client })
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response, CatalogError> {
        debug!(url, "Getting url");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

impl CatalogTransport for HttpTransport {
    fn get_text(&self, url: &str) -> Result<FetchedPage, CatalogError> {
        let response = self.send(url)?;
        let final_url = response.url().to_string();
        let body = response
            .text()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        Ok(FetchedPage {
            body,
            url: final_url,
        })
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self.send(url)?;
        let bytes = response
            .bytes()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// In-memory transport used by the unit tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::{CatalogError, CatalogTransport, FetchedPage};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned bodies per URL and records every request.
    ///
    /// URLs without a canned body fail like an unreachable host.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        texts: HashMap<String, String>,
        blobs: HashMap<String, Vec<u8>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_text(mut self, url: &str, body: &str) -> Self {
            self.texts.insert(url.to_string(), body.to_string());
            self
        }

        pub(crate) fn with_bytes(mut self, url: &str, body: Vec<u8>) -> Self {
            self.blobs.insert(url.to_string(), body);
            self
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl CatalogTransport for FakeTransport {
        fn get_text(&self, url: &str) -> Result<FetchedPage, CatalogError> {
            self.requests.borrow_mut().push(url.to_string());
            self.texts
                .get(url)
                .map(|body| FetchedPage {
                    body: body.clone(),
                    url: url.to_string(),
                })
                .ok_or_else(|| CatalogError::RequestError(format!("connection refused: {url}")))
        }

        fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
            self.requests.borrow_mut().push(url.to_string());
            self.blobs.get(url).cloned().ok_or(CatalogError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
