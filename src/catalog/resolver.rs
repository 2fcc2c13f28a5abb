//! Walks the catalog's result graph down to individual subtitles.
//!
//! A search hit is either terminal (a movie or an episode, whose detail
//! page lists releases) or a tv show that expands into the episodes of all
//! of its seasons. Each fetch that fails simply contributes nothing.

use super::client::CatalogClient;
use super::transport::CatalogTransport;
use super::types::{CatalogResult, ReleaseDetail};
use crate::candidate::Candidate;
use tracing::{debug, warn};

/// Runs a search and returns the hits worth expanding.
///
/// A failed search and a search reporting zero matches both yield no hits.
pub fn search_results<T: CatalogTransport>(
    client: &CatalogClient<T>,
    query: &str,
) -> Vec<CatalogResult> {
    let Some(response) = client.search(query) else {
        return Vec::new();
    };

    if response.total == 0 {
        debug!(query, "Catalog reported no matches");
        return Vec::new();
    }

    response.results
}

/// Flattens one hit into the candidates of all of its releases.
pub fn expand_result<T: CatalogTransport>(
    client: &CatalogClient<T>,
    result: &CatalogResult,
) -> Vec<Candidate> {
    match result {
        CatalogResult::Movie { id } => flatten_releases(client.movie(*id)),
        CatalogResult::Episode { id } => flatten_releases(client.episode(*id)),
        CatalogResult::TvShow { id } => {
            let Some(show) = client.tvshow(*id) else {
                return Vec::new();
            };

            show.seasons
                .iter()
                .flat_map(|season| &season.episodes)
                .flat_map(|episode| expand_result(client, &CatalogResult::Episode { id: episode.id }))
                .collect()
        }
        CatalogResult::Unsupported => {
            warn!("Skipping catalog result of unsupported type");
            Vec::new()
        }
    }
}

/// Searches the catalog and collects every candidate, in catalog order.
pub fn resolve<T: CatalogTransport>(client: &CatalogClient<T>, query: &str) -> Vec<Candidate> {
    search_results(client, query)
        .iter()
        .flat_map(|result| expand_result(client, result))
        .collect()
}

fn flatten_releases(detail: Option<ReleaseDetail>) -> Vec<Candidate> {
    let Some(detail) = detail else {
        return Vec::new();
    };

    detail
        .releases
        .iter()
        .flat_map(|release| &release.subtitles)
        .filter_map(|entry| {
            let candidate = Candidate::from_entry(entry);
            if candidate.is_none() {
                warn!(uri = %entry.uri, "Subtitle uri without id and file name");
            }
            candidate
        })
        .collect()
}
