//! Google Generative Language embedding provider (`models/embedding-001`).
//!
//! Documents are embedded with task type `RETRIEVAL_DOCUMENT`, questions with
//! `RETRIEVAL_QUERY`, both through `batchEmbedContents`.

use docchat_core::config::{Credentials, EmbeddingConfig};
use docchat_core::traits::Embedder;
use docchat_core::ProviderError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{build_client, from_transport, read_json};

/// API limit on requests per batch call.
const MAX_BATCH: usize = 100;

pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    dim: usize,
    id: String,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig, credentials: &Credentials) -> Result<Self, ProviderError> {
        let model = normalize_model(&config.model);
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key: credentials.api_key.clone(),
            endpoint: format!("{}/v1beta/{}:batchEmbedContents", config.base_url.trim_end_matches('/'), model),
            id: format!("gemini:{model}:d{}", config.dimension),
            dim: config.dimension,
            model,
        })
    }

    fn embed_with_task(&self, texts: &[String], task_type: &'static str) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            out.extend(self.request(batch, task_type)?);
        }
        Ok(out)
    }

    fn request(&self, texts: &[String], task_type: &'static str) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = BatchRequest {
            requests: texts
                .iter()
                .map(|t| EmbedRequest {
                    model: &self.model,
                    content: Content { parts: vec![Part { text: t }] },
                    task_type,
                })
                .collect(),
        };
        debug!(count = texts.len(), task_type, "requesting embeddings");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| from_transport(&e))?;
        let parsed: BatchResponse = read_json(response)?;
        if parsed.embeddings.len() != texts.len() {
            return Err(ProviderError::Fatal(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        parsed
            .embeddings
            .into_iter()
            .map(|e| {
                if e.values.len() == self.dim {
                    Ok(e.values)
                } else {
                    Err(ProviderError::Fatal(format!(
                        "model returned {} dimensions, configured for {}",
                        e.values.len(),
                        self.dim
                    )))
                }
            })
            .collect()
    }
}

impl Embedder for GeminiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.embed_with_task(texts, "RETRIEVAL_DOCUMENT")
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_with_task(&[text.to_string()], "RETRIEVAL_QUERY")?
            .pop()
            .ok_or_else(|| ProviderError::Fatal("provider returned no embedding for the query".into()))
    }
}

fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") { model.to_string() } else { format!("models/{model}") }
}
