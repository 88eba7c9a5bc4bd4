//! Shared plumbing for the Gemini HTTP providers.

use std::time::Duration;

use docchat_core::ProviderError;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;

pub fn build_client(timeout_secs: u64) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::Fatal(format!("HTTP client setup failed: {e}")))
}

/// Timeouts and connection failures may clear up; anything else will not.
pub fn from_transport(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() {
        ProviderError::Transient(format!("HTTP error: {e}"))
    } else {
        ProviderError::Fatal(format!("HTTP error: {e}"))
    }
}

pub fn from_status(status: StatusCode, body: &str) -> ProviderError {
    let msg = format!("API returned {status}: {}", truncate(body, 300));
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        ProviderError::Transient(msg)
    } else {
        ProviderError::Fatal(msg)
    }
}

/// Fail on non-2xx, decode JSON otherwise.
pub fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(from_status(status, &body));
    }
    response
        .json()
        .map_err(|e| ProviderError::Fatal(format!("JSON parse error: {e}")))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
