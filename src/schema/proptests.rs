//! Property-based tests for the structured output validator
//!
//! - Any serialized step validates back to an equal value
//! - Validated steps never carry a next action outside the enum
//! - Values outside the enum are always rejected
//! - Dropping any required field is always rejected

use super::*;
use proptest::prelude::*;

fn arb_next_action() -> impl Strategy<Value = NextAction> {
    prop_oneof![Just(NextAction::Continue), Just(NextAction::FinalAnswer)]
}

fn arb_step() -> impl Strategy<Value = ReasoningStep> {
    (".{0,80}", ".{0,400}", arb_next_action()).prop_map(|(title, content, next_action)| {
        ReasoningStep {
            title,
            content,
            next_action,
        }
    })
}

proptest! {
    /// serialize → validate is the identity for reasoning steps
    #[test]
    fn prop_step_round_trip(step in arb_step()) {
        let raw = serde_json::to_string(&step).unwrap();
        let validated = validate(&raw, OutputKind::ReasoningStep).unwrap();
        prop_assert_eq!(validated, StructuredValue::Step(step));
    }

    /// serialize → validate is the identity for final answers
    #[test]
    fn prop_answer_round_trip(title in ".{0,80}", content in ".{0,400}") {
        let answer = FinalAnswer { title, content };
        let raw = serde_json::to_string(&answer).unwrap();
        let validated = validate_as::<FinalAnswer>(&raw).unwrap();
        prop_assert_eq!(validated, answer);
    }

    /// Any next_action string other than the two enum values is rejected
    #[test]
    fn prop_unknown_next_action_rejected(action in "[a-zA-Z_ ]{0,20}") {
        prop_assume!(action != "continue" && action != "final_answer");
        let raw = serde_json::json!({
            "title": "t",
            "content": "c",
            "next_action": action,
        })
        .to_string();
        let is_invalid_enum = matches!(
            validate(&raw, OutputKind::ReasoningStep),
            Err(ValidationError::InvalidEnumValue { .. })
        );
        prop_assert!(is_invalid_enum);
    }

    /// Removing any one required field is rejected with MissingField
    #[test]
    fn prop_missing_field_rejected(step in arb_step(), index in 0usize..3) {
        let mut value = serde_json::to_value(&step).unwrap();
        let name = REASONING_STEP_SCHEMA.fields[index].name;
        value.as_object_mut().unwrap().remove(name);
        prop_assert_eq!(
            validate(&value.to_string(), OutputKind::ReasoningStep),
            Err(ValidationError::MissingField(name))
        );
    }

    /// Arbitrary text never validates into a malformed value: either an
    /// error, or a step whose fields are all present
    #[test]
    fn prop_arbitrary_text_never_yields_partial_value(raw in ".{0,200}") {
        if let Ok(StructuredValue::Step(step)) = validate(&raw, OutputKind::ReasoningStep) {
            prop_assert!(matches!(
                step.next_action,
                NextAction::Continue | NextAction::FinalAnswer
            ));
        }
    }
}
