use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by an embedding or generation provider.
///
/// Transient failures (timeouts, rate limits, upstream 5xx) and fatal ones
/// (bad credentials, malformed responses) are both surfaced to the user; the
/// split only tells the caller whether trying again later could help.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("provider failure: {0}")]
    Fatal(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("No text could be extracted from the supplied documents")]
    EmptyCorpus,

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(ProviderError),

    #[error("Generation error: {0}")]
    Generation(ProviderError),

    #[error("No index found at {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("Index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("Index was built with embedder '{indexed}' but the current embedder is '{current}'")]
    ModelMismatch { indexed: String, current: String },

    #[error("Vector dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to persist index: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short message for the interactive surface, never a trace.
    pub fn user_message(&self) -> String {
        match self {
            Self::IndexNotFound(_) | Self::IndexCorrupt(_) => {
                "No index available. Ingest documents first.".to_string()
            }
            Self::EmptyCorpus => "Could not extract any text from the supplied documents.".to_string(),
            Self::ModelMismatch { .. } => {
                "The index was built with a different embedding model. Ingest the documents again.".to_string()
            }
            Self::EmbeddingProvider(e) if e.is_transient() => {
                "The embedding service is temporarily unavailable. Try again shortly.".to_string()
            }
            Self::EmbeddingProvider(_) => "The embedding service rejected the request. Check the API key.".to_string(),
            Self::Generation(_) => "Sorry, an answer could not be generated right now.".to_string(),
            Self::EmptyQuestion => "Please enter a question.".to_string(),
            Self::MissingCredential(var) => format!("Set {var} before starting."),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
