//! Deterministic, offline embedder for tests and development.
//!
//! Each whitespace token is hashed into one of `dim` buckets; the bucket
//! weights are L2-normalised. Texts sharing words land close together, which
//! is enough for exercising retrieval without a model.

use std::hash::{Hash, Hasher};

use docchat_core::traits::Embedder;
use docchat_core::ProviderError;
use twox_hash::XxHash64;

pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:xxh64:d{dim}") }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0 + ((h >> 32) as u32) as f32 / u32::MAX as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn shapes_and_determinism() {
        let e = HashEmbedder::new(64);
        let embs = e.embed_batch(&["hello world".to_string(), "hello world".to_string()]).unwrap();
        assert_eq!(embs.len(), 2);
        assert_eq!(embs[0].len(), 64);
        let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
        assert_eq!(embs[0], embs[1]);
    }

    #[test]
    fn shared_words_score_higher() {
        let e = HashEmbedder::new(256);
        let q = e.embed_query("How do I start a fire?").unwrap();
        let near = e.embed_query("To start a fire, gather dry tinder.").unwrap();
        let far = e.embed_query("Bread dough needs yeast and time.").unwrap();
        assert!(cosine(&q, &near) > cosine(&q, &far));
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let e = HashEmbedder::new(8);
        assert!(e.embed_query("  ").unwrap().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn id_carries_dimension() {
        assert_eq!(HashEmbedder::new(32).embedder_id(), "hash:xxh64:d32");
    }
}
