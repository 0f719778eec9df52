//! Property-based tests for response normalization
//!
//! - Normalizing the same result twice gives the same answer
//! - The answer is never empty, whatever the backend sent
//! - Blank candidate values always fall back
//! - Extracted text is trimmed

use super::{extract_answer, normalize, AnswerSource, TECHNICAL_DIFFICULTY_FALLBACK};
use crate::config::BackendMode;
use crate::inference::{InferenceError, InferenceOutcome};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_mode() -> impl Strategy<Value = BackendMode> {
    prop_oneof![
        Just(BackendMode::QaPair),
        Just(BackendMode::FreeText),
        Just(BackendMode::Instruction),
    ]
}

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("answer".to_string()),
        Just("generated_text".to_string()),
        Just("summary_text".to_string()),
        Just("score".to_string()),
        "[a-z_]{1,12}",
    ]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| Value::Number(n.into())),
        "[ \\t\\n]{0,4}[a-zA-Z0-9 .,!?]{0,40}[ \\t\\n]{0,4}".prop_map(Value::String),
    ]
}

fn arb_mapping() -> impl Strategy<Value = Value> {
    proptest::collection::vec((arb_key(), arb_scalar()), 0..6)
        .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>()))
}

/// Result shapes backends actually produce, plus a few they should not
fn arb_result() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_mapping(),
        proptest::collection::vec(arb_mapping(), 0..4).prop_map(Value::Array),
        proptest::collection::vec(arb_scalar(), 0..4).prop_map(Value::Array),
        arb_scalar(),
    ]
}

fn blank() -> impl Strategy<Value = Value> {
    "[ \\t\\n\\r]{0,6}".prop_map(Value::String)
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(result in arb_result(), mode in arb_mode()) {
        let outcome = InferenceOutcome::Completed(result);
        prop_assert_eq!(normalize(&outcome, mode), normalize(&outcome, mode));
    }

    #[test]
    fn prop_answer_is_never_empty(result in arb_result(), mode in arb_mode()) {
        let answer = normalize(&InferenceOutcome::Completed(result), mode);
        prop_assert!(!answer.text.trim().is_empty());
    }

    #[test]
    fn prop_extracted_text_is_trimmed(result in arb_result(), mode in arb_mode()) {
        if let Some(text) = extract_answer(&result, mode.candidate_fields()) {
            prop_assert_eq!(text.trim(), text.as_str());
            prop_assert!(!text.is_empty());
        }
    }

    #[test]
    fn prop_blank_candidates_fall_back(
        a in blank(),
        b in blank(),
        wrap in any::<bool>(),
        mode in arb_mode(),
    ) {
        let fields = mode.candidate_fields();
        let mut map = Map::new();
        map.insert(fields[0].to_string(), a);
        map.insert(fields[1].to_string(), b);
        let mapping = Value::Object(map);
        let result = if wrap { Value::Array(vec![mapping]) } else { mapping };

        let answer = normalize(&InferenceOutcome::Completed(result), mode);
        prop_assert_eq!(answer.source, AnswerSource::NoAnswer);
        prop_assert_eq!(answer.text.as_str(), mode.no_answer_fallback());
    }

    #[test]
    fn prop_unavailable_always_uses_technical_fallback(
        message in "[a-z ]{0,30}",
        mode in arb_mode(),
    ) {
        let outcome = InferenceOutcome::Unavailable(InferenceError::network(message));
        let answer = normalize(&outcome, mode);
        prop_assert_eq!(answer.text.as_str(), TECHNICAL_DIFFICULTY_FALLBACK);
        prop_assert_eq!(answer.source, AnswerSource::Unavailable);
    }
}
