//! Chat request handling
//!
//! Validates an inbound payload, asks the inference backend once, normalizes
//! the answer, logs the exchange, and assembles the reply. Backend and
//! logging failures are absorbed here; only validation and internal errors
//! reach the caller.

mod payload;

pub use payload::{ChatInput, ChatPayload};

use crate::config::{BackendMode, GenerationParams};
use crate::conversation_log::ConversationLogger;
use crate::inference::{invoke_once, InferenceBackend, InferenceRequest};
use crate::normalizer::normalize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Required fields missing or blank
    #[error("{0}")]
    Validation(String),
    /// Anything else unexpected
    #[error("{0}")]
    Internal(String),
}

/// A successful reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    pub response: String,
    pub session_id: String,
    /// Epoch seconds at reply time
    pub timestamp: i64,
}

/// One request handler, parameterized by backend mode
pub struct ChatRelay {
    mode: BackendMode,
    generation: GenerationParams,
    backend: Arc<dyn InferenceBackend>,
    logger: ConversationLogger,
}

impl ChatRelay {
    pub fn new(
        mode: BackendMode,
        generation: GenerationParams,
        backend: Arc<dyn InferenceBackend>,
        logger: ConversationLogger,
    ) -> Self {
        Self {
            mode,
            generation,
            backend,
            logger,
        }
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Handle a raw request body
    pub async fn handle_body(&self, raw: &[u8]) -> Result<ChatAnswer, RelayError> {
        let payload = ChatPayload::from_body(raw)?;
        self.handle(&payload).await
    }

    /// Handle an already decoded payload
    pub async fn handle(&self, payload: &ChatPayload) -> Result<ChatAnswer, RelayError> {
        let input = payload.input_for(self.mode)?;

        let session_id = payload
            .supplied_session_id()
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

        let request = self.build_request(&input);
        let outcome = invoke_once(self.backend.as_ref(), &request).await;
        let answer = normalize(&outcome, self.mode);

        // Outcome is informational; the reply does not depend on it
        let _ = self
            .logger
            .log(&session_id, input.question_text(), &answer.text)
            .await;

        tracing::info!(
            session_id = %session_id,
            mode = %self.mode,
            source = answer.source.as_str(),
            "Chat request answered"
        );

        Ok(ChatAnswer {
            response: answer.text,
            session_id,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    fn build_request(&self, input: &ChatInput) -> InferenceRequest {
        match (self.mode, input) {
            (_, ChatInput::Qa { question, context }) => {
                InferenceRequest::qa_pair(question.as_str(), context.as_str())
            }
            (BackendMode::Instruction, ChatInput::Message(message)) => {
                InferenceRequest::instruction(message, self.generation)
            }
            (BackendMode::QaPair | BackendMode::FreeText, ChatInput::Message(message)) => {
                InferenceRequest::free_text(message.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation_log::InteractionStore;
    use crate::db::{Database, Interaction};
    use crate::inference::InferenceError;
    use crate::normalizer::TECHNICAL_DIFFICULTY_FALLBACK;
    use crate::testing::{FailingStore, MockBackend, RecordingStore};
    use serde_json::json;
    use std::time::Duration;

    fn relay_with(
        mode: BackendMode,
        backend: Arc<MockBackend>,
        store: Arc<dyn InteractionStore>,
    ) -> ChatRelay {
        ChatRelay::new(
            mode,
            GenerationParams::default(),
            backend,
            ConversationLogger::new(store, Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn test_legacy_message_is_answered() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_result(json!([{ "answer": "Paris" }]));
        let store = Arc::new(RecordingStore::new());
        let relay = relay_with(BackendMode::QaPair, backend.clone(), store.clone());

        let answer = relay
            .handle_body(
                br#"{"message": "What is the capital of France?|||Paris is the capital of France.", "session_id": "s-42"}"#,
            )
            .await
            .unwrap();

        assert_eq!(answer.response, "Paris");
        assert_eq!(answer.session_id, "s-42");
        assert_eq!(
            backend.recorded_requests(),
            vec![InferenceRequest::qa_pair(
                "What is the capital of France?",
                "Paris is the capital of France."
            )]
        );

        let logged = store.recorded();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].session_id, "s-42");
        assert_eq!(logged[0].question_text, "What is the capital of France?");
        assert_eq!(logged[0].answer_text, "Paris");
    }

    #[tokio::test]
    async fn test_validation_failure_skips_backend() {
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(RecordingStore::new());
        let relay = relay_with(BackendMode::QaPair, backend.clone(), store.clone());

        let err = relay
            .handle_body(br#"{"session_id": "test-session-123"}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Validation(_)));
        assert!(backend.recorded_requests().is_empty());
        assert!(store.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_session_id_is_generated_when_missing() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_result(json!({ "generated_text": "Hi!" }));
        backend.queue_result(json!({ "generated_text": "Hi again!" }));
        let relay = relay_with(
            BackendMode::FreeText,
            backend,
            Arc::new(RecordingStore::new()),
        );

        let first = relay.handle_body(br#"{"message": "hello"}"#).await.unwrap();
        let second = relay
            .handle_body(br#"{"message": "hello", "session_id": ""}"#)
            .await
            .unwrap();

        assert!(!first.session_id.is_empty());
        assert!(uuid::Uuid::parse_str(&first.session_id).is_ok());
        assert_ne!(first.session_id, second.session_id);

        let now = chrono::Utc::now().timestamp();
        assert!((now - first.timestamp).abs() <= 5);
    }

    #[tokio::test]
    async fn test_backend_timeout_still_answers() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_error(InferenceError::timeout("Request timeout"));
        let store = Arc::new(RecordingStore::new());
        let relay = relay_with(BackendMode::FreeText, backend, store.clone());

        let answer = relay.handle_body(br#"{"message": "hello"}"#).await.unwrap();

        assert_eq!(answer.response, TECHNICAL_DIFFICULTY_FALLBACK);
        assert_eq!(store.recorded()[0].answer_text, TECHNICAL_DIFFICULTY_FALLBACK);
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_change_reply() {
        let ok_backend = Arc::new(MockBackend::new());
        ok_backend.queue_result(json!([{ "answer": "Paris" }]));
        let failing_backend = Arc::new(MockBackend::new());
        failing_backend.queue_result(json!([{ "answer": "Paris" }]));

        let body = br#"{"question": "Capital?", "context": "Paris is the capital.", "session_id": "s"}"#;
        let healthy = relay_with(BackendMode::QaPair, ok_backend, Arc::new(RecordingStore::new()))
            .handle_body(body)
            .await
            .unwrap();
        let degraded = relay_with(BackendMode::QaPair, failing_backend, Arc::new(FailingStore))
            .handle_body(body)
            .await
            .unwrap();

        assert_eq!(healthy.response, degraded.response);
        assert_eq!(healthy.session_id, degraded.session_id);
    }

    #[tokio::test]
    async fn test_instruction_mode_sends_generation_params() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_result(json!([{ "generated_text": "Because of Rayleigh scattering." }]));
        let relay = relay_with(
            BackendMode::Instruction,
            backend.clone(),
            Arc::new(RecordingStore::new()),
        );

        let answer = relay
            .handle_body(br#"{"message": "Why is the sky blue?"}"#)
            .await
            .unwrap();

        assert_eq!(answer.response, "Because of Rayleigh scattering.");
        let requests = backend.recorded_requests();
        assert!(matches!(
            &requests[0],
            InferenceRequest::Instruction { prompt, params }
                if prompt.contains("Why is the sky blue?") && *params == GenerationParams::default()
        ));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_internal() {
        let backend = Arc::new(MockBackend::new());
        let relay = relay_with(
            BackendMode::QaPair,
            backend.clone(),
            Arc::new(RecordingStore::new()),
        );

        let err = relay.handle_body(b"invalid json").await.unwrap_err();
        assert!(matches!(err, RelayError::Internal(_)));
        assert!(backend.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_exchange_lands_in_database() {
        let db = Database::open_in_memory().unwrap();
        let backend = Arc::new(MockBackend::new());
        backend.queue_result(json!({ "generated_text": "Sure thing." }));
        let relay = relay_with(BackendMode::FreeText, backend, Arc::new(db.clone()));

        relay
            .handle_body(br#"{"message": "Can you help?", "session_id": "db-session"}"#)
            .await
            .unwrap();

        let rows: Vec<Interaction> = db.interactions_for_session("db-session").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question_text, "Can you help?");
        assert_eq!(rows[0].answer_text, "Sure thing.");
    }
}
