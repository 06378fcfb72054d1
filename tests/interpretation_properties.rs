//! Property tests for extraction, normalization and sanitization

use halo_core::command::normalize::normalize_intents;
use halo_core::core::types::Target;
use halo_core::llm::extract::extract_candidate;
use halo_core::llm::sanitize::sanitize_reply;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        // Braces and quotes inside strings must not confuse the scanner
        "[a-z{}\\[\\]\" :]{0,12}".prop_map(Value::String),
    ]
}

fn arb_object() -> impl Strategy<Value = Value> {
    let leaf = arb_scalar();
    let tree = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    });
    prop::collection::btree_map("[a-z]{1,6}", tree, 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
}

/// An intent element that may or may not yield an action
fn arb_element() -> impl Strategy<Value = (Value, Option<String>)> {
    prop_oneof![
        "[a-z_]{1,10}".prop_map(|a| (json!({ "action": a.clone() }), Some(a))),
        "[a-z_]{1,10}".prop_map(|a| (json!(a.clone()), Some(a))),
        "[a-z_]{1,10}".prop_map(|a| (json!(format!("{}:x", a)), Some(a))),
        Just((json!({ "target": "orphan" }), None)),
        Just((json!("   "), None)),
        Just((json!(42), None)),
        Just((Value::Null, None)),
    ]
}

proptest! {
    #[test]
    fn clean_blocks_extract_unchanged(object in arb_object()) {
        let block = object.to_string();
        prop_assert_eq!(extract_candidate(&block), block);
    }

    #[test]
    fn brace_free_text_is_only_trimmed(text in "[^{}`]{0,40}") {
        prop_assert_eq!(extract_candidate(&text), text.trim());
    }

    #[test]
    fn volume_targets_clamp_into_range(
        alias in prop_oneof![Just("set_volume"), Just("set_volume_level"), Just("set_volume_value")],
        level in -1_000_000i64..1_000_000,
        as_text in any::<bool>(),
    ) {
        let target = if as_text { json!(format!("{}%", level)) } else { json!(level) };
        let intents = normalize_intents(&json!([{ "action": alias, "target": target }]));

        prop_assert_eq!(intents.len(), 1);
        prop_assert_eq!(intents[0].action.as_str(), "set_volume");
        match intents[0].target {
            Some(Target::Integer(n)) => prop_assert!((0..=100).contains(&n)),
            ref other => prop_assert!(false, "expected integer target, got {:?}", other),
        }
    }

    #[test]
    fn underivable_elements_drop_and_order_holds(elements in prop::collection::vec(arb_element(), 0..12)) {
        let raw = Value::Array(elements.iter().map(|(value, _)| value.clone()).collect());
        let expected: Vec<String> = elements.into_iter().filter_map(|(_, action)| action).collect();

        let actions: Vec<String> = normalize_intents(&raw).into_iter().map(|i| i.action).collect();
        prop_assert_eq!(actions, expected);
    }

    #[test]
    fn sanitized_reply_has_no_brackets(text in "[a-z {}\\[\\]\":,]{0,40}") {
        let reply = sanitize_reply(&text, "...");
        prop_assert!(!reply.is_empty());
        prop_assert!(!reply.contains(['{', '}', '[', ']']), "reply was {:?}", reply);
    }
}
