//! Outbound request shapes and their wire encoding

use crate::config::GenerationParams;
use serde::Serialize;
use serde_json::Value;

/// Marker that precedes the model's answer in instruction prompts
pub const RESPONSE_MARKER: &str = "### Response:";

/// A request to the inference backend.
///
/// The variant is fixed by the deployed backend mode.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceRequest {
    FreeText {
        text: String,
    },
    QaPair {
        question: String,
        context: String,
    },
    Instruction {
        prompt: String,
        params: GenerationParams,
    },
}

impl InferenceRequest {
    pub fn free_text(text: impl Into<String>) -> Self {
        Self::FreeText { text: text.into() }
    }

    pub fn qa_pair(question: impl Into<String>, context: impl Into<String>) -> Self {
        Self::QaPair {
            question: question.into(),
            context: context.into(),
        }
    }

    /// Wrap a user message in the instruction template
    pub fn instruction(message: &str, params: GenerationParams) -> Self {
        Self::Instruction {
            prompt: format!("### Instruction:\n{message}\n\n{RESPONSE_MARKER}\n"),
            params,
        }
    }

    /// Encode into the JSON body the backend expects
    pub fn to_payload(&self) -> Value {
        let wire = match self {
            Self::FreeText { text } => WireRequest {
                inputs: WireInputs::Text(text),
                parameters: None,
            },
            Self::QaPair { question, context } => WireRequest {
                inputs: WireInputs::Qa { question, context },
                parameters: None,
            },
            Self::Instruction { prompt, params } => WireRequest {
                inputs: WireInputs::Text(prompt),
                parameters: Some(WireParameters {
                    max_new_tokens: params.max_new_tokens,
                    temperature: params.temperature,
                    top_p: params.top_p,
                    do_sample: params.do_sample,
                    return_full_text: false,
                }),
            },
        };
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }
}

// Backend wire types

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    inputs: WireInputs<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<WireParameters>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireInputs<'a> {
    Text(&'a str),
    Qa { question: &'a str, context: &'a str },
}

#[derive(Debug, Serialize)]
struct WireParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}
