//! Inbound chat payload parsing and validation

use super::RelayError;
use crate::config::BackendMode;
use serde::Deserialize;
use serde_json::Value;

/// Separator for the legacy combined `question|||context` message
pub const LEGACY_DELIMITER: &str = "|||";

const QA_REQUIRED: &str = "Both question and context are required. Provide fields \"question\" and \"context\", or use \"question|||context\" in \"message\".";
const MESSAGE_REQUIRED: &str = "Message is required. Provide a non-empty \"message\" field.";

/// Fields a caller may send. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatPayload {
    pub message: Option<String>,
    pub question: Option<String>,
    pub context: Option<String>,
    pub prompt: Option<String>,
    pub session_id: Option<String>,
}

/// What the backend will be asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Qa { question: String, context: String },
    Message(String),
}

impl ChatInput {
    /// Text recorded as the user's side of the exchange
    pub fn question_text(&self) -> &str {
        match self {
            ChatInput::Qa { question, .. } => question,
            ChatInput::Message(message) => message,
        }
    }
}

impl ChatPayload {
    /// Decode a raw request body.
    ///
    /// Accepts either the payload object itself or a gateway proxy event whose
    /// `body` field carries the payload as a JSON string.
    pub fn from_body(raw: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| RelayError::Internal(format!("Invalid request body: {e}")))?;

        let value = match value {
            Value::Object(mut event) if event.contains_key("body") => match event.remove("body") {
                Some(Value::String(body)) => serde_json::from_str(&body)
                    .map_err(|e| RelayError::Internal(format!("Invalid event body: {e}")))?,
                Some(inner @ Value::Object(_)) => inner,
                _ => Value::Object(event),
            },
            other => other,
        };

        serde_json::from_value(value)
            .map_err(|e| RelayError::Internal(format!("Unexpected payload shape: {e}")))
    }

    /// Caller's session id as sent, if it is not blank
    pub fn supplied_session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Resolve the fields required by `mode`.
    pub fn input_for(&self, mode: BackendMode) -> Result<ChatInput, RelayError> {
        match mode {
            BackendMode::QaPair => self.qa_input(),
            BackendMode::FreeText | BackendMode::Instruction => non_blank(self.message.as_deref())
                .or_else(|| non_blank(self.question.as_deref()))
                .or_else(|| non_blank(self.prompt.as_deref()))
                .map(|message| ChatInput::Message(message.to_string()))
                .ok_or_else(|| RelayError::Validation(MESSAGE_REQUIRED.to_string())),
        }
    }

    fn qa_input(&self) -> Result<ChatInput, RelayError> {
        let mut question = non_blank(self.question.as_deref());
        let mut context = non_blank(self.context.as_deref());

        if question.is_none() {
            if let Some(message) = non_blank(self.message.as_deref()) {
                match split_legacy(message) {
                    Some((q, c)) => {
                        question = non_blank(Some(q));
                        context = non_blank(Some(c));
                    }
                    None => question = Some(message),
                }
            }
        }

        match (question, context) {
            (Some(question), Some(context)) => Ok(ChatInput::Qa {
                question: question.to_string(),
                context: context.to_string(),
            }),
            _ => Err(RelayError::Validation(QA_REQUIRED.to_string())),
        }
    }
}

/// Split `question|||context` on the first delimiter, trimming both halves.
pub fn split_legacy(message: &str) -> Option<(&str, &str)> {
    message
        .split_once(LEGACY_DELIMITER)
        .map(|(question, context)| (question.trim(), context.trim()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
