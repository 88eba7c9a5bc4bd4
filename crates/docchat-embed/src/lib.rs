//! Embedding providers behind [`docchat_core::traits::Embedder`].

pub mod gemini;
pub mod hash;
pub mod http;
#[cfg(feature = "local")]
pub mod local;

use docchat_core::config::{Credentials, EmbeddingConfig, EmbeddingProviderKind};
use docchat_core::traits::Embedder;
use docchat_core::{Error, Result};
use tracing::info;

pub use gemini::GeminiEmbedder;
pub use hash::HashEmbedder;
#[cfg(feature = "local")]
pub use local::BgeM3Embedder;

/// Env switch that forces [`HashEmbedder`] regardless of the configured provider.
pub const FAKE_EMBEDDINGS_VAR: &str = "APP_USE_FAKE_EMBEDDINGS";

pub fn use_fake_embeddings() -> bool {
    std::env::var(FAKE_EMBEDDINGS_VAR)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the embedder selected by `config`. Only the Gemini provider needs credentials.
pub fn get_default_embedder(config: &EmbeddingConfig, credentials: Option<&Credentials>) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        info!(dim = config.dimension, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(config.dimension)));
    }
    match config.provider {
        EmbeddingProviderKind::Hash => Ok(Box::new(HashEmbedder::new(config.dimension))),
        EmbeddingProviderKind::Gemini => {
            let credentials = credentials
                .ok_or_else(|| Error::MissingCredential(docchat_core::config::API_KEY_VAR.to_string()))?;
            let embedder = GeminiEmbedder::new(config, credentials).map_err(Error::EmbeddingProvider)?;
            info!(id = embedder.embedder_id(), "using Gemini embeddings");
            Ok(Box::new(embedder))
        }
        EmbeddingProviderKind::Local => local_embedder(),
    }
}

#[cfg(feature = "local")]
fn local_embedder() -> Result<Box<dyn Embedder>> {
    let embedder = BgeM3Embedder::new().map_err(|e| Error::InvalidConfig(format!("local embedder: {e}")))?;
    Ok(Box::new(embedder))
}

#[cfg(not(feature = "local"))]
fn local_embedder() -> Result<Box<dyn Embedder>> {
    Err(Error::InvalidConfig(
        "embedding.provider = \"local\" requires building with the `local` feature".into(),
    ))
}
