//! In-memory vector index with exact cosine search.

use std::path::Path;

use docchat_core::types::{Chunk, SearchHit};
use docchat_core::{Error, Result};

use crate::store;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Chunks with their embeddings, in insertion order, all produced by one
/// embedder of dimension `dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
    embedder_id: String,
    dim: usize,
}

impl VectorIndex {
    /// # Panics
    ///
    /// If `chunks` and `embeddings` differ in length, are empty, or the
    /// embeddings do not all share one non-zero dimension.
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>, embedder_id: impl Into<String>) -> Self {
        assert_eq!(chunks.len(), embeddings.len(), "chunks and embeddings length must match");
        assert!(!chunks.is_empty(), "an index needs at least one entry");
        let dim = embeddings[0].len();
        assert!(dim > 0, "embeddings must be non-empty");
        assert!(embeddings.iter().all(|e| e.len() == dim), "all embeddings must have dimension {dim}");
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        Self::from_entries(entries, embedder_id.into(), dim)
    }

    /// Entries already validated by the caller.
    pub(crate) fn from_entries(entries: Vec<IndexEntry>, embedder_id: String, dim: usize) -> Self {
        let norms = entries.iter().map(|e| l2_norm(&e.embedding)).collect();
        Self { entries, norms, embedder_id, dim }
    }

    pub fn embedder_id(&self) -> &str { &self.embedder_id }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entries(&self) -> &[IndexEntry] { &self.entries }

    /// The `k` entries most similar to `query`, nearest first. Equal scores
    /// keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (entry, &norm))| (i, cosine(query, query_norm, &entry.embedding, norm)))
            .collect();
        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchHit { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    /// Write the index to `location`, replacing whatever was there.
    pub fn persist(&self, location: &Path) -> Result<()> {
        store::persist(self, location)
    }

    pub fn load(location: &Path) -> Result<Self> {
        store::load(location)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    // `+ 0.0` folds -0.0 into 0.0 so total_cmp keeps zero scores tied.
    dot / (a_norm * b_norm) + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(i: usize, s: &str) -> Chunk {
        Chunk { index: i, content: s.to_string() }
    }

    fn sample() -> VectorIndex {
        VectorIndex::build(
            vec![chunk(0, "x"), chunk(1, "y"), chunk(2, "xy"), chunk(3, "x again")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![2.0, 0.0]],
            "test:d2",
        )
    }

    #[test]
    fn nearest_first_with_ties_in_insertion_order() {
        let hits = sample().search(&[1.0, 0.0], 4).unwrap();
        let order: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
        assert_eq!(order, vec!["x", "x again", "xy", "y"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - 1.0).abs() < 1e-6);
        assert!(hits[3].score.abs() < 1e-6);
    }

    #[test]
    fn signed_zero_scores_tie_in_insertion_order() {
        let index = VectorIndex::build(
            vec![chunk(0, "negative zero"), chunk(1, "positive zero")],
            vec![vec![-0.0, 1.0], vec![0.0, 1.0]],
            "test:d2",
        );
        let hits = index.search(&[1.0, -0.0], 2).unwrap();
        let order: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
        assert_eq!(order, vec!["negative zero", "positive zero"]);
        assert!(hits.iter().all(|h| h.score == 0.0 && h.score.is_sign_positive()));
    }

    #[test]
    fn fewer_entries_than_k_returns_all() {
        let hits = sample().search(&[0.0, 1.0], 10).unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].chunk.content, "y");
    }

    #[test]
    fn zero_k_returns_nothing() {
        assert!(sample().search(&[0.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn query_dimension_must_match() {
        let err = sample().search(&[1.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn zero_query_scores_zero() {
        let hits = sample().search(&[0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].score, 0.0);
        assert_eq!(hits[0].chunk.content, "x");
    }

    #[test]
    #[should_panic(expected = "length must match")]
    fn build_rejects_count_mismatch() {
        let _ = VectorIndex::build(vec![chunk(0, "a")], vec![], "t");
    }

    #[test]
    #[should_panic(expected = "dimension")]
    fn build_rejects_ragged_embeddings() {
        let _ = VectorIndex::build(vec![chunk(0, "a"), chunk(1, "b")], vec![vec![1.0], vec![1.0, 2.0]], "t");
    }

    #[test]
    #[should_panic(expected = "at least one entry")]
    fn build_rejects_empty_input() {
        let _ = VectorIndex::build(Vec::new(), Vec::new(), "t");
    }
}
