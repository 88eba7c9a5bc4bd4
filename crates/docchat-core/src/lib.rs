//! Shared building blocks of the docchat pipeline: configuration, the error
//! taxonomy, domain types, capability traits, text extraction and chunking.

pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod traits;
pub mod types;

pub use error::{Error, ProviderError, Result};
