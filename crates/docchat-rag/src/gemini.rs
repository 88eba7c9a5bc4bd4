//! Gemini `generateContent` client.

use docchat_core::config::{Credentials, GenerationConfig};
use docchat_core::traits::Generator;
use docchat_core::ProviderError;
use docchat_embed::http::{build_client, from_transport, read_json};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationParams,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationParams {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig, credentials: &Credentials) -> Result<Self, ProviderError> {
        let model = config.model.trim_start_matches("models/").to_string();
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key: credentials.api_key.clone(),
            endpoint: format!("{}/v1beta/models/{}:generateContent", config.base_url.trim_end_matches('/'), model),
            model,
            temperature: config.temperature,
        })
    }
}

impl Generator for GeminiGenerator {
    fn model_id(&self) -> &str { &self.model }

    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![Part { text: prompt }] }],
            generation_config: GenerationParams { temperature: self.temperature },
        };
        debug!(model = %self.model, "requesting completion");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| from_transport(&e))?;
        let parsed: GenerateResponse = read_json(response)?;
        first_candidate_text(parsed)
    }
}

fn first_candidate_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Fatal("model returned no candidates".into()))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ProviderError::Fatal("model returned an empty candidate".into()));
    }
    Ok(text)
}
