use std::path::{Path, PathBuf};

use docchat_core::traits::Embedder;
use docchat_core::types::RetrievedContext;
use docchat_core::{Error, Result};
use docchat_vector::VectorIndex;
use tracing::debug;

/// Embeds a question and fetches the `top_k` nearest chunks.
#[derive(Debug, Clone)]
pub struct Retriever {
    top_k: usize,
    location: PathBuf,
}

impl Retriever {
    /// `location` is only reported when no index is loaded.
    pub fn new(top_k: usize, location: impl Into<PathBuf>) -> Self {
        Self { top_k, location: location.into() }
    }

    pub fn top_k(&self) -> usize { self.top_k }

    pub fn location(&self) -> &Path { &self.location }

    pub fn retrieve(
        &self,
        index: Option<&VectorIndex>,
        embedder: &dyn Embedder,
        question: &str,
    ) -> Result<RetrievedContext> {
        let index = index.ok_or_else(|| Error::IndexNotFound(self.location.clone()))?;
        if index.embedder_id() != embedder.embedder_id() {
            return Err(Error::ModelMismatch {
                indexed: index.embedder_id().to_string(),
                current: embedder.embedder_id().to_string(),
            });
        }
        let query = embedder.embed_query(question).map_err(Error::EmbeddingProvider)?;
        let hits = index.search(&query, self.top_k)?;
        debug!(k = self.top_k, hits = hits.len(), top = hits.first().map(|h| h.score), "retrieved context");
        Ok(RetrievedContext { hits })
    }
}
