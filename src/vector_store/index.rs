//! Immutable in-memory vector index with exact cosine search.

use super::{cosine_similarity, SearchHit};
use crate::chunking::Chunk;
use crate::error::{Result, VidbriefError};
use std::collections::HashSet;
use tracing::{debug, error};

#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// A searchable index over one transcript's chunks.
///
/// Exact search: every query is scored against every entry. Ties are broken
/// by chunk id, lower first, so results are fully deterministic.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<Entry>,
    dimensions: usize,
    model_id: String,
}

impl VectorIndex {
    /// Build an index from parallel sequences of chunks and their vectors.
    ///
    /// `model_id` identifies the embedder that produced the vectors; queries
    /// must come from the same embedder.
    pub fn build(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(mismatch(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dimensions == 0 {
            return Err(mismatch("empty embedding vector".to_string()));
        }

        let mut seen_ids = HashSet::with_capacity(chunks.len());
        let mut entries = Vec::with_capacity(chunks.len());

        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            if vector.len() != dimensions {
                return Err(mismatch(format!(
                    "chunk {} has {} dimensions, expected {}",
                    chunk.id,
                    vector.len(),
                    dimensions
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(VidbriefError::InvalidArgument(format!(
                    "chunk {} has a non-finite embedding value",
                    chunk.id
                )));
            }
            if !seen_ids.insert(chunk.id) {
                return Err(VidbriefError::InvalidArgument(format!(
                    "duplicate chunk id {}",
                    chunk.id
                )));
            }
            entries.push(Entry { chunk, vector });
        }

        let model_id = model_id.into();
        debug!(
            "Built vector index with {} entries ({} dimensions, model {})",
            entries.len(),
            dimensions,
            model_id
        );

        Ok(Self {
            entries,
            dimensions,
            model_id,
        })
    }

    /// Return the `k` most similar chunks, ordered by descending score.
    ///
    /// Returns every entry when the index holds fewer than `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.search_with_threshold(query, k, f32::NEG_INFINITY)
    }

    /// Like [`search`](Self::search), dropping hits scored below `min_score`.
    pub fn search_with_threshold(
        &self,
        query: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(VidbriefError::InvalidArgument(
                "k must be positive".to_string(),
            ));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(mismatch(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(VidbriefError::InvalidArgument(
                "query has a non-finite embedding value".to_string(),
            ));
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        hits.truncate(k);
        hits.retain(|hit| hit.score >= min_score);

        Ok(hits)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality of the stored vectors (0 for an empty index).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Identifier of the embedder the index was built with.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Indexed chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

fn mismatch(detail: String) -> VidbriefError {
    error!("Vector index consistency violation: {}", detail);
    VidbriefError::DimensionMismatch(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: usize, text: &str) -> Chunk {
        Chunk {
            id,
            text: text.to_string(),
            start_offset: id * 10,
            end_offset: id * 10 + text.chars().count(),
        }
    }

    fn five_entry_index() -> VectorIndex {
        let chunks = (0..5).map(|i| chunk(i, &format!("chunk {}", i))).collect();
        let vectors = vec![
            vec![0.8, 0.6],
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.6, 0.8],
        ];
        VectorIndex::build(chunks, vectors, "test").unwrap()
    }

    #[test]
    fn test_top_k_ordering() {
        let index = five_entry_index();
        let hits = index.search(&[1.0, 0.0], 3).unwrap();

        let ids: Vec<usize> = hits.iter().map(|h| h.chunk.id).collect();
        assert_eq!(ids, vec![3, 0, 4]);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!((hits[1].score - 0.8).abs() < 1e-5);
        assert!((hits[2].score - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_graceful_shrink() {
        let chunks = vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")];
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let index = VectorIndex::build(chunks, vectors, "test").unwrap();

        let hits = index.search(&[1.0, 0.0], 10).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.chunk.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let chunks = vec![chunk(0, "x"), chunk(1, "y"), chunk(2, "z")];
        let vectors = vec![vec![0.0, 1.0], vec![2.0, 0.0], vec![1.0, 0.0]];
        let index = VectorIndex::build(chunks, vectors, "test").unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk.id, 1);
        assert_eq!(hits[1].chunk.id, 2);
    }

    #[test]
    fn test_orthogonal_ties_broken_by_id() {
        let chunks = vec![chunk(0, "left"), chunk(1, "right")];
        let vectors = vec![vec![-1.0, 0.0], vec![1.0, 0.0]];
        let index = VectorIndex::build(chunks, vectors, "test").unwrap();

        let hits = index.search(&[0.0, -1.0], 2).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.chunk.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn test_non_finite_query_rejected() {
        let index = five_entry_index();
        assert!(matches!(
            index.search(&[f32::NAN, 1.0], 3),
            Err(VidbriefError::InvalidArgument(_))
        ));
        assert!(matches!(
            index.search_with_threshold(&[f32::INFINITY, 0.0], 3, 0.0),
            Err(VidbriefError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_k_rejected() {
        let index = five_entry_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 0),
            Err(VidbriefError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_build_length_mismatch() {
        let chunks = vec![chunk(0, "a"), chunk(1, "b")];
        let vectors = vec![vec![1.0, 0.0]];
        assert!(matches!(
            VectorIndex::build(chunks, vectors, "test"),
            Err(VidbriefError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_build_inconsistent_dimensions() {
        let chunks = vec![chunk(0, "a"), chunk(1, "b")];
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        assert!(matches!(
            VectorIndex::build(chunks, vectors, "test"),
            Err(VidbriefError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_ids_and_nan() {
        let dup = VectorIndex::build(
            vec![chunk(0, "a"), chunk(0, "b")],
            vec![vec![1.0], vec![2.0]],
            "test",
        );
        assert!(matches!(dup, Err(VidbriefError::InvalidArgument(_))));

        let nan = VectorIndex::build(vec![chunk(0, "a")], vec![vec![f32::NAN]], "test");
        assert!(matches!(nan, Err(VidbriefError::InvalidArgument(_))));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = five_entry_index();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 2),
            Err(VidbriefError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_threshold_filters_after_ranking() {
        let index = five_entry_index();
        let hits = index.search_with_threshold(&[1.0, 0.0], 5, 0.5).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score >= 0.5));
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::build(Vec::new(), Vec::new(), "test").unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 3).unwrap().is_empty());
    }
}
