//! Inference client
//!
//! Sends one request to the hosted inference endpoint and reports either the
//! decoded response body or a failure value. Failures never escape as errors
//! past [`invoke_once`].

mod error;
mod http;
mod payload;

pub use error::{InferenceError, InferenceErrorKind};
pub use http::HttpInferenceBackend;
pub use payload::{InferenceRequest, RESPONSE_MARKER};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Common interface for inference backends
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send a single request and decode the JSON result
    async fn invoke(&self, request: &InferenceRequest) -> Result<Value, InferenceError>;

    /// Endpoint identifier, for logs
    fn endpoint(&self) -> &str;
}

/// What came back from one inference attempt
#[derive(Debug, Clone)]
pub enum InferenceOutcome {
    /// Backend answered with a JSON body (possibly unhelpful)
    Completed(Value),
    /// Backend could not be used for this request
    Unavailable(InferenceError),
}

impl From<Result<Value, InferenceError>> for InferenceOutcome {
    fn from(result: Result<Value, InferenceError>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(e) => Self::Unavailable(e),
        }
    }
}

/// Invoke the backend exactly once and fold any failure into the outcome.
pub async fn invoke_once(
    backend: &dyn InferenceBackend,
    request: &InferenceRequest,
) -> InferenceOutcome {
    backend.invoke(request).await.into()
}

/// Logging wrapper for inference backends
pub struct LoggingBackend {
    inner: Arc<dyn InferenceBackend>,
    endpoint: String,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn InferenceBackend>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl InferenceBackend for LoggingBackend {
    async fn invoke(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        let start = std::time::Instant::now();
        let result = self.inner.invoke(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    "Inference request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    transient = e.kind.is_transient(),
                    error = %e.message,
                    "Inference request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
