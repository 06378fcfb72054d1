//! Canonicalize the intent shapes language models actually emit
//!
//! Accepted inputs: a list of objects, a single object, or a list of
//! `"action:target"` / `"action"` strings, freely mixed. Elements that yield
//! no action are dropped; order is otherwise preserved and nothing is
//! deduplicated.

use crate::core::types::{Intent, Target};
use serde_json::{Map, Value};

/// Keys checked, in order, for the action name
const ACTION_KEYS: [&str; 3] = ["action", "type", "name"];

/// Keys checked, in order, for the target
const TARGET_KEYS: [&str; 3] = ["target", "value", "arg"];

pub const SET_VOLUME: &str = "set_volume";

/// Spellings models use for `set_volume`
const SET_VOLUME_ALIASES: [&str; 2] = ["set_volume_level", "set_volume_value"];

/// Normalize the decoded `intents` value into canonical intents
pub fn normalize_intents(raw: &Value) -> Vec<Intent> {
    let items: &[Value] = match raw {
        Value::Array(items) => items,
        Value::Object(_) => std::slice::from_ref(raw),
        _ => return Vec::new(),
    };

    items.iter().filter_map(normalize_element).collect()
}

fn normalize_element(item: &Value) -> Option<Intent> {
    let intent = match item {
        Value::Object(map) => from_mapping(map),
        Value::String(text) => from_text(text),
        _ => None,
    };

    if intent.is_none() {
        tracing::debug!("Dropping intent element without an action: {}", item);
    }
    intent
}

fn from_mapping(map: &Map<String, Value>) -> Option<Intent> {
    let action = ACTION_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|action| !action.is_empty())?;

    let target = TARGET_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
        .and_then(Target::from_json);

    Some(canonicalize(action, target))
}

fn from_text(text: &str) -> Option<Intent> {
    let text = text.trim();

    let (action, target) = match text.split_once(':') {
        Some((action, target)) => {
            let target = target.trim();
            let target = (!target.is_empty()).then(|| Target::from(target));
            (action.trim(), target)
        }
        None => (text, None),
    };

    if action.is_empty() {
        return None;
    }
    Some(canonicalize(action, target))
}

/// Map known aliases onto their canonical action name
pub fn canonical_action(action: &str) -> &str {
    if SET_VOLUME_ALIASES.contains(&action) {
        SET_VOLUME
    } else {
        action
    }
}

fn canonicalize(action: &str, target: Option<Target>) -> Intent {
    let action = canonical_action(action);
    let target = if action == SET_VOLUME {
        target.map(clamp_volume)
    } else {
        target
    };
    Intent::new(action, target)
}

/// Coerce a volume target to an integer percentage in `[0, 100]`
///
/// Text keeps only its digits ("50%" → 50, "about 120" → 100). Targets that
/// cannot be read as a number come back unchanged.
pub fn clamp_volume(target: Target) -> Target {
    match target {
        Target::Integer(n) => Target::Integer(n.clamp(0, 100)),
        Target::Float(x) if x.is_finite() => Target::Integer((x.trunc() as i64).clamp(0, 100)),
        Target::Text(text) => match volume_from_text(&text) {
            Some(n) => Target::Integer(n),
            None => Target::Text(text),
        },
        other => other,
    }
}

fn volume_from_text(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    // Too many digits for u64 is still "more than 100"
    let n = digits.parse::<u64>().map_or(100, |n| n.min(100));
    Some(n as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_of_mappings() {
        let intents = normalize_intents(&json!([
            {"action": "open_website", "target": "youtube.com"},
            {"action": "mute_system"}
        ]));
        assert_eq!(
            intents,
            vec![
                Intent::new("open_website", Some("youtube.com".into())),
                Intent::bare("mute_system"),
            ]
        );
    }

    #[test]
    fn test_single_mapping() {
        let intents = normalize_intents(&json!({"type": "shutdown"}));
        assert_eq!(intents, vec![Intent::bare("shutdown")]);
    }

    #[test]
    fn test_absent_or_odd_shapes_yield_nothing() {
        assert!(normalize_intents(&Value::Null).is_empty());
        assert!(normalize_intents(&json!("open_app")).is_empty());
        assert!(normalize_intents(&json!(42)).is_empty());
    }

    #[test]
    fn test_alternate_key_names() {
        let intents = normalize_intents(&json!([
            {"name": "open_app", "value": "spotify"},
            {"type": "search_web", "arg": "rust traits"}
        ]));
        assert_eq!(intents[0], Intent::new("open_app", Some("spotify".into())));
        assert_eq!(intents[1], Intent::new("search_web", Some("rust traits".into())));
    }

    #[test]
    fn test_action_key_precedence_skips_empty() {
        let intents = normalize_intents(&json!([{"action": "  ", "type": "restart"}]));
        assert_eq!(intents, vec![Intent::bare("restart")]);
    }

    #[test]
    fn test_zero_target_is_kept() {
        let intents = normalize_intents(&json!([{"action": "set_volume", "target": 0, "value": 80}]));
        assert_eq!(intents, vec![Intent::new("set_volume", Some(Target::Integer(0)))]);
    }

    #[test]
    fn test_volume_alias_and_clamp() {
        let intents = normalize_intents(&json!([
            {"action": "set_volume_level", "target": "150%"},
            {"action": "set_volume_value", "target": "30 percent"},
            {"action": "set_volume", "target": -20},
            {"action": "set_volume", "target": 42.9}
        ]));
        let targets: Vec<_> = intents.iter().map(|i| i.target.clone()).collect();
        assert!(intents.iter().all(|i| i.action == "set_volume"));
        assert_eq!(
            targets,
            vec![
                Some(Target::Integer(100)),
                Some(Target::Integer(30)),
                Some(Target::Integer(0)),
                Some(Target::Integer(42)),
            ]
        );
    }

    #[test]
    fn test_unparseable_volume_left_unchanged() {
        let intents = normalize_intents(&json!([{"action": "set_volume", "target": "loud"}]));
        assert_eq!(intents[0].target, Some(Target::from("loud")));
    }

    #[test]
    fn test_huge_volume_text_clamps() {
        let intents = normalize_intents(&json!(["set_volume:99999999999999999999999"]));
        assert_eq!(intents[0].target, Some(Target::Integer(100)));
    }

    #[test]
    fn test_string_forms() {
        let intents = normalize_intents(&json!([
            "open_app: chrome",
            "mute_system",
            "set_volume_level : 75%",
            "search_web:time: now"
        ]));
        assert_eq!(
            intents,
            vec![
                Intent::new("open_app", Some("chrome".into())),
                Intent::bare("mute_system"),
                Intent::new("set_volume", Some(Target::Integer(75))),
                Intent::new("search_web", Some("time: now".into())),
            ]
        );
    }

    #[test]
    fn test_underivable_elements_dropped_order_kept() {
        let intents = normalize_intents(&json!([
            "first",
            {"target": "orphan"},
            "   ",
            ":no_action",
            7,
            {"action": "second"},
            "first"
        ]));
        let actions: Vec<_> = intents.iter().map(|i| i.action.as_str()).collect();
        assert_eq!(actions, vec!["first", "second", "first"]);
    }
}
