//! Orders candidates for presentation.
//!
//! The download count is the catalog's only quality signal, so candidates are
//! sorted by it alone. The sort is stable: equally popular candidates keep the
//! order the catalog returned them in.

use crate::candidate::Candidate;
use crate::messages::{DownloadRequest, SelectableItem};
use std::cmp::Reverse;
use std::collections::HashSet;

/// A candidate with its 1-based position in the ranked list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    /// 1-based position
    pub index: usize,
    /// The candidate at this position
    pub candidate: Candidate,
}

impl RankedCandidate {
    /// Two-digit, zero-padded position used for display and selection.
    pub fn display_index(&self) -> String {
        format!("{:02}", self.index)
    }

    /// The download request for this candidate.
    pub fn download_request(&self) -> DownloadRequest {
        DownloadRequest {
            catalog_id: self.candidate.catalog_id.clone(),
            retrieval_link: self.candidate.retrieval_link.clone(),
            target_filename: self.candidate.filename.clone(),
            filter: None,
            sort_order: Some(self.display_index()),
        }
    }

    /// Renders the candidate as an entry of the selection list.
    pub fn to_item(&self) -> SelectableItem {
        SelectableItem {
            index: self.display_index(),
            label: self.candidate.language.clone(),
            label2: self.candidate.filename.clone(),
            rating: self.candidate.popularity,
            language_code: self.candidate.language_code.clone(),
            hearing_impaired: self.candidate.hearing_impaired,
            reference: self.download_request().to_reference(),
        }
    }
}

/// Drops repeated subtitles, keeping the first occurrence.
///
/// A show hit and an episode hit in the same search reach the same subtitles.
pub fn deduplicate(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.catalog_id.clone(), c.retrieval_link.clone())))
        .collect()
}

/// Sorts candidates by popularity, most popular first, and numbers them.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<RankedCandidate> {
    candidates.sort_by_key(|c| Reverse(c.popularity));

    candidates
        .into_iter()
        .enumerate()
        .map(|(position, candidate)| RankedCandidate {
            index: position + 1,
            candidate,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, popularity: u64) -> Candidate {
        Candidate {
            language: "Spanish".to_string(),
            language_code: "es".to_string(),
            filename: format!("sub-{id}.srt"),
            popularity,
            hearing_impaired: false,
            catalog_id: id.to_string(),
            retrieval_link: format!("http://www.argenteam.net/subtitles/{id}/sub-{id}.srt"),
        }
    }

    fn ids(ranked: &[RankedCandidate]) -> Vec<&str> {
        ranked.iter().map(|r| r.candidate.catalog_id.as_str()).collect()
    }

    #[test]
    fn test_rank_by_popularity() {
        let ranked = rank(vec![candidate("1", 5), candidate("2", 50), candidate("3", 10)]);

        assert_eq!(ids(&ranked), vec!["2", "3", "1"]);
        assert_eq!(
            ranked.iter().map(|r| r.display_index()).collect::<Vec<_>>(),
            vec!["01", "02", "03"]
        );
    }

    #[test]
    fn test_rank_is_stable() {
        let ranked = rank(vec![
            candidate("a", 3),
            candidate("b", 7),
            candidate("c", 3),
            candidate("d", 7),
            candidate("e", 3),
        ]);

        assert_eq!(ids(&ranked), vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let once = rank(vec![candidate("a", 1), candidate("b", 9), candidate("c", 1)]);
        let twice = rank(once.iter().map(|r| r.candidate.clone()).collect());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let unique = deduplicate(vec![
            candidate("1", 1),
            candidate("2", 2),
            candidate("1", 1),
        ]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].catalog_id, "1");
        assert_eq!(unique[1].catalog_id, "2");
    }

    #[test]
    fn test_item_reference_round_trips_to_request() {
        let ranked = rank(vec![candidate("7", 1), candidate("8", 2)]);
        let item = ranked[1].to_item();

        assert_eq!(item.index, "02");
        assert_eq!(item.label, "Spanish");
        assert_eq!(item.label2, "sub-7.srt");

        let request = DownloadRequest::from_reference(&item.reference).unwrap();
        assert_eq!(request, ranked[1].download_request());
        assert_eq!(request.sort_order.as_deref(), Some("02"));
    }
}
