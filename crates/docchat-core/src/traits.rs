use crate::error::ProviderError;

/// Maps text to fixed-dimension vectors.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `gemini:models/embedding-001`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// Compute one embedding per input text, in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| ProviderError::Fatal("provider returned no embedding for the query".into()))
    }
}

/// Produces natural-language text for a prompt.
pub trait Generator: Send + Sync {
    fn model_id(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn embedder_id(&self) -> &str { (**self).embedder_id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> { (**self).embed_batch(texts) }
}

impl<T: Generator + ?Sized> Generator for Box<T> {
    fn model_id(&self) -> &str { (**self).model_id() }
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> { (**self).generate(prompt) }
}
