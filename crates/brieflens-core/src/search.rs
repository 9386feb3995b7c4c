//! Cosine similarity search over a [`TfidfIndex`].
//!
//! # Algorithm
//!
//! 1. Vectorize the query with the index's fitted vocabulary.
//! 2. Score every chunk: `(row · query) / (‖row‖ × ‖query‖)`, or `0.0`
//!    when either norm is zero.
//! 3. Stable sort by score, descending, so ties keep chunk order.
//! 4. Keep the top `k`.
//! 5. Apply the optional [`ChunkFilter`]. Filtering happens after ranking,
//!    so it can return fewer than `k` results, including none.
//! 6. Number the survivors `1..=m`.

use crate::models::{Chunk, SourceCitation};
use crate::tfidf::{SparseVector, TfidfIndex};

/// Metadata predicate applied to ranked candidates.
pub enum ChunkFilter {
    /// Keep chunks whose client, matter or document name contains any of
    /// these names (case-insensitive).
    Entities(Vec<String>),
    /// Keep chunks for which the closure returns `true`.
    Predicate(Box<dyn Fn(&Chunk) -> bool + Send + Sync>),
}

impl ChunkFilter {
    pub fn matches(&self, chunk: &Chunk) -> bool {
        match self {
            ChunkFilter::Entities(names) => entity_matches(names, chunk),
            ChunkFilter::Predicate(f) => f(chunk),
        }
    }
}

impl std::fmt::Debug for ChunkFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkFilter::Entities(names) => f.debug_tuple("Entities").field(names).finish(),
            ChunkFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

fn entity_matches(names: &[String], chunk: &Chunk) -> bool {
    let fields = [
        chunk.client.as_deref(),
        chunk.matter.as_deref(),
        Some(chunk.document_name.as_str()),
    ];
    names.iter().any(|name| {
        let needle = name.to_lowercase();
        !needle.is_empty()
            && fields
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
    })
}

/// Cosine similarity from precomputed norms.
pub fn cosine_similarity(row: &SparseVector, row_norm: f64, query: &SparseVector, query_norm: f64) -> f64 {
    let denom = row_norm * query_norm;
    if denom <= f64::EPSILON {
        return 0.0;
    }
    row.dot(query) / denom
}

/// Similarity of `query` to every chunk, in chunk order.
pub fn score_all(index: &TfidfIndex, query: &str) -> Vec<f64> {
    let q = index.query_vector(query);
    let q_norm = q.norm();
    index
        .rows()
        .iter()
        .zip(index.norms())
        .map(|(row, norm)| cosine_similarity(row, *norm, &q, q_norm))
        .collect()
}

/// Return up to `k` ranked citations for `query`.
///
/// An empty index yields an empty list.
pub fn search(
    index: &TfidfIndex,
    query: &str,
    k: usize,
    filter: Option<&ChunkFilter>,
) -> Vec<SourceCitation> {
    if index.is_empty() || k == 0 {
        return Vec::new();
    }

    let scores = score_all(index, query);
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(k);

    order
        .into_iter()
        .map(|i| (&index.chunks()[i], scores[i]))
        .filter(|(chunk, _)| filter.map_or(true, |f| f.matches(chunk)))
        .enumerate()
        .map(|(rank, (chunk, score))| SourceCitation::from_chunk(chunk, rank + 1, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{chunk_documents, ChunkingParams};
    use crate::models::Document;
    use crate::tfidf::TfidfParams;

    fn build(docs: &[Document]) -> TfidfIndex {
        let params = ChunkingParams {
            window_words: 12,
            overlap_words: 3,
        };
        TfidfIndex::build(chunk_documents(docs, &params), &TfidfParams::default())
    }

    fn legal_docs() -> Vec<Document> {
        vec![
            Document::new(
                "complaint",
                "Complaint.txt",
                "Johnson Corporation filed a complaint against Smith for breach of contract. \
                 The complaint seeks damages.",
            )
            .with_client("Johnson Corporation"),
            Document::new(
                "lease",
                "Lease.txt",
                "The tenant shall pay monthly rent to the landlord under this commercial lease.",
            )
            .with_client("Riverside Holdings LLC"),
            Document::new(
                "nda",
                "NDA.txt",
                "The receiving party shall keep confidential information secret for three years.",
            )
            .with_client("Meridian Health Partners"),
        ]
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = TfidfIndex::build(Vec::new(), &TfidfParams::default());
        assert!(search(&index, "anything", 5, None).is_empty());
    }

    #[test]
    fn test_self_match_is_top_one() {
        let index = build(&legal_docs());
        for chunk in index.chunks() {
            let results = search(&index, &chunk.text, 3, None);
            assert_eq!(results[0].chunk_id, chunk.id);
            assert!((results[0].score - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ranks_contiguous_and_bounded_by_k() {
        let index = build(&legal_docs());
        let results = search(&index, "complaint lease", 2, None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_zero_overlap_scores_zero_in_chunk_order() {
        let index = build(&legal_docs());
        let results = search(&index, "quantum physics equations", 10, None);
        assert_eq!(results.len(), index.chunk_count());
        assert!(results.iter().all(|r| r.score == 0.0));
        let ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
        let expected: Vec<&str> = index.chunks().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_filter_applies_after_ranking() {
        let index = build(&legal_docs());
        let filter = ChunkFilter::Entities(vec!["Meridian".to_string()]);
        // The NDA chunk ranks below k=1 for a lease query, so filtering leaves nothing.
        let results = search(&index, "tenant rent lease", 1, Some(&filter));
        assert!(results.is_empty());

        let results = search(&index, "tenant rent lease", 10, Some(&filter));
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|r| r.client.as_deref() == Some("Meridian Health Partners")));
        assert_eq!(results[0].rank, 1);
    }

    #[test]
    fn test_predicate_filter() {
        let index = build(&legal_docs());
        let filter = ChunkFilter::Predicate(Box::new(|c: &Chunk| c.document_name == "Lease.txt"));
        let results = search(&index, "confidential information", 10, Some(&filter));
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.document == "Lease.txt"));
        assert_eq!(results[1].rank, 2);
    }

    #[test]
    fn test_entity_filter_matches_document_name() {
        let docs = legal_docs();
        let index = build(&docs);
        let filter = ChunkFilter::Entities(vec!["nda".to_string()]);
        let chunk = index.chunks().iter().find(|c| c.document_id == "nda").unwrap();
        assert!(filter.matches(chunk));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let docs = legal_docs();
        let a = build(&docs);
        let b = build(&docs);
        assert_eq!(a.chunk_count(), b.chunk_count());
        let ra = search(&a, "breach of contract damages", 1, None);
        let rb = search(&b, "breach of contract damages", 1, None);
        assert_eq!(ra[0].chunk_id, rb[0].chunk_id);
        assert_eq!(ra[0].score, rb[0].score);
    }
}
