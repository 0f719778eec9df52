//! HTTP inference backend (hosted model endpoint)

use super::{InferenceBackend, InferenceError, InferenceRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Longest slice of an error body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Backend reached over HTTP with JSON in and JSON out.
///
/// One attempt per call. reqwest never retries on its own, so a timed-out or
/// failed request is reported immediately.
pub struct HttpInferenceBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpInferenceBackend {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .timeout(connect_timeout + read_timeout)
            .build()
            .map_err(|e| InferenceError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> InferenceError {
        let message = truncate(body);
        match status.as_u16() {
            429 => InferenceError::throttled(format!("Throttled: {message}")),
            400..=499 => InferenceError::rejected(format!("HTTP {status}: {message}")),
            500..=599 => InferenceError::server_error(format!("Server error {status}: {message}")),
            _ => InferenceError::unknown(format!("HTTP {status}: {message}")),
        }
    }

    fn classify_transport(e: &reqwest::Error, during: &str) -> InferenceError {
        if e.is_timeout() {
            InferenceError::timeout(format!("Request timeout while {during}: {e}"))
        } else if e.is_connect() {
            InferenceError::network(format!("Connection failed: {e}"))
        } else if e.is_body() || e.is_request() {
            InferenceError::network(format!("Request failed while {during}: {e}"))
        } else {
            InferenceError::unknown(format!("Request failed while {during}: {e}"))
        }
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceBackend {
    async fn invoke(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&request.to_payload());
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e, "sending"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport(&e, "reading response"))?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            InferenceError::malformed_body(format!(
                "Failed to parse response: {e} - body: {}",
                truncate(&body)
            ))
        })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => body.get(..idx).unwrap_or(body),
        None => body,
    }
}
