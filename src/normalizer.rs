//! Response normalization
//!
//! Turns whatever the inference backend returned into a single display
//! string. Backends answer with either one JSON object or an array of them,
//! and name the answer field differently per model family, so extraction
//! walks a mode-specific list of candidate keys and falls back to a fixed
//! sentence when nothing usable is found.

#[cfg(test)]
mod proptests;

use crate::config::BackendMode;
use crate::inference::{InferenceOutcome, RESPONSE_MARKER};
use serde_json::Value;

/// Reply used when the backend could not be reached or answered garbage
pub const TECHNICAL_DIFFICULTY_FALLBACK: &str =
    "I'm experiencing some technical difficulties. Please try again in a moment.";

/// Where a normalized answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Extracted from the backend result
    Backend,
    /// Backend answered but no candidate field held text
    NoAnswer,
    /// Backend failed; extraction was skipped
    Unavailable,
}

impl AnswerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::NoAnswer => "no_answer",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Display text plus its provenance. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAnswer {
    pub text: String,
    pub source: AnswerSource,
}

impl NormalizedAnswer {
    fn fallback(text: &str, source: AnswerSource) -> Self {
        Self {
            text: text.to_string(),
            source,
        }
    }
}

/// Normalize one inference outcome for the given backend mode.
pub fn normalize(outcome: &InferenceOutcome, mode: BackendMode) -> NormalizedAnswer {
    let result = match outcome {
        InferenceOutcome::Completed(result) => result,
        InferenceOutcome::Unavailable(_) => {
            return NormalizedAnswer::fallback(
                TECHNICAL_DIFFICULTY_FALLBACK,
                AnswerSource::Unavailable,
            );
        }
    };

    let extracted = extract_answer(result, mode.candidate_fields()).and_then(|text| match mode {
        BackendMode::Instruction => strip_instruction_echo(&text),
        BackendMode::QaPair | BackendMode::FreeText => Some(text),
    });

    match extracted {
        Some(text) => NormalizedAnswer {
            text,
            source: AnswerSource::Backend,
        },
        None => NormalizedAnswer::fallback(mode.no_answer_fallback(), AnswerSource::NoAnswer),
    }
}

/// Pull the first non-blank answer out of a backend result.
///
/// A mapping is scanned for `fields` in order. For a sequence only the first
/// element is considered: a mapping element is scanned the same way, a
/// scalar element is used as is. Returned text is trimmed.
pub fn extract_answer(result: &Value, fields: &[&str]) -> Option<String> {
    match result {
        Value::Object(_) => first_field(result, fields),
        Value::Array(items) => match items.first()? {
            first @ Value::Object(_) => first_field(first, fields),
            scalar => scalar_text(scalar),
        },
        _ => None,
    }
}

fn first_field(map: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| map.get(field))
        .find_map(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Drop an echoed instruction prompt, keeping only the model's reply.
fn strip_instruction_echo(text: &str) -> Option<String> {
    let reply = match text.rsplit_once(RESPONSE_MARKER) {
        Some((_, reply)) => reply.trim(),
        None => text,
    };
    (!reply.is_empty()).then(|| reply.to_string())
}
