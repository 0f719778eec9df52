//! Mock implementations for testing
//!
//! These mocks let the relay run end to end without a model endpoint or a
//! real store.

use crate::conversation_log::InteractionStore;
use crate::db::Interaction;
use crate::inference::{InferenceBackend, InferenceError, InferenceRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock inference backend
// ============================================================================

/// Backend that returns queued results and records every request
pub struct MockBackend {
    results: Mutex<VecDeque<Result<Value, InferenceError>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful result
    pub fn queue_result(&self, value: Value) {
        self.results.lock().unwrap().push_back(Ok(value));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: InferenceError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn invoke(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::unknown("No more mock results")))
    }

    fn endpoint(&self) -> &str {
        "mock://inference"
    }
}

// ============================================================================
// Interaction stores
// ============================================================================

/// Store that keeps interactions in memory
pub struct RecordingStore {
    interactions: Mutex<Vec<Interaction>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            interactions: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Interaction> {
        self.interactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionStore for RecordingStore {
    async fn put_interaction(&self, interaction: &Interaction) -> Result<(), String> {
        self.interactions.lock().unwrap().push(interaction.clone());
        Ok(())
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl InteractionStore for FailingStore {
    async fn put_interaction(&self, _interaction: &Interaction) -> Result<(), String> {
        Err("ProvisionedThroughputExceeded: write throttled".to_string())
    }
}

/// Store whose writes hang for a fixed time before succeeding
pub struct StallingStore {
    stall: Duration,
}

impl StallingStore {
    pub fn new(stall: Duration) -> Self {
        Self { stall }
    }
}

#[async_trait]
impl InteractionStore for StallingStore {
    async fn put_interaction(&self, _interaction: &Interaction) -> Result<(), String> {
        tokio::time::sleep(self.stall).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_backend_drains_queue() {
        let mock = MockBackend::new();
        mock.queue_result(json!({ "answer": "yes" }));

        let request = InferenceRequest::free_text("q");
        assert_eq!(mock.invoke(&request).await.unwrap(), json!({ "answer": "yes" }));

        // Second call should fail (no more results)
        assert!(mock.invoke(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }
}
