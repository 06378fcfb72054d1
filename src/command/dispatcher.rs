//! Intent dispatch - runs canonical intents against capability handlers
//!
//! Intents execute strictly in order, one at a time. A lookup miss, a
//! resolution miss, a handler error or a handler panic only costs that one
//! intent; the rest of the batch still runs.

use crate::command::registry::ActionRegistry;
use crate::core::types::Intent;
use crate::skills::{Arity, SkillLoader};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Executes intents through the registry and a skill loader
pub struct Dispatcher<'a> {
    registry: &'a ActionRegistry,
    loader: &'a dyn SkillLoader,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a ActionRegistry, loader: &'a dyn SkillLoader) -> Self {
        Self { registry, loader }
    }

    /// Run every intent, returning the non-empty messages in intent order
    ///
    /// Intents that produce no output contribute nothing: there are no
    /// placeholders in the result.
    pub fn dispatch(&self, intents: &[Intent]) -> Vec<String> {
        intents
            .iter()
            .filter_map(|intent| self.dispatch_one(intent))
            .collect()
    }

    fn dispatch_one(&self, intent: &Intent) -> Option<String> {
        tracing::debug!("Dispatching {}", intent);

        let Some(entry) = self.registry.get(&intent.action) else {
            tracing::warn!("Unknown action '{}', skipping", intent.action);
            return None;
        };

        let skill = match self
            .loader
            .resolve(&entry.handler.group, &entry.handler.handler)
        {
            Ok(skill) => skill,
            Err(e) => {
                tracing::warn!("Cannot dispatch '{}': {}", intent.action, e);
                return None;
            }
        };

        let argument = match skill.arity() {
            Arity::Nullary => None,
            Arity::Unary => intent.target.as_ref(),
        };

        let value = match panic::catch_unwind(AssertUnwindSafe(|| skill.invoke(argument))) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::error!("Error executing '{}': {}", intent.action, e);
                return None;
            }
            Err(payload) => {
                tracing::error!(
                    "Handler for '{}' panicked: {}",
                    intent.action,
                    panic_message(payload.as_ref())
                );
                return None;
            }
        };

        let message = render_output(value);
        if let Some(message) = &message {
            tracing::info!("{} -> {}", entry.handler, message);
        }
        message
    }
}

/// Turn a handler's return value into a human-readable message
///
/// `null` is silent. A string is used verbatim. An object with a non-blank
/// `"summary"` string yields that summary; any other object yields its
/// compact JSON. Everything else is rendered as JSON text.
pub fn render_output(value: Value) -> Option<String> {
    let message = match value {
        Value::Null => return None,
        Value::String(text) => text,
        Value::Object(map) => {
            let summary = map
                .get("summary")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|summary| !summary.is_empty())
                .map(str::to_string);
            summary.unwrap_or_else(|| Value::Object(map).to_string())
        }
        other => other.to_string(),
    };

    (!message.trim().is_empty()).then_some(message)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::registry::RegistryEntry;
    use crate::core::types::Target;
    use crate::skills::{SkillError, SkillGroup, SkillSet};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn registry(entries: &[(&str, &str, &str)]) -> ActionRegistry {
        entries
            .iter()
            .map(|(action, group, handler)| {
                (action.to_string(), RegistryEntry::new(*group, *handler))
            })
            .collect()
    }

    #[test]
    fn test_render_output() {
        assert_eq!(render_output(Value::Null), None);
        assert_eq!(render_output(json!("Opening chrome.")), Some("Opening chrome.".into()));
        assert_eq!(render_output(json!("  ")), None);
        assert_eq!(
            render_output(json!({"summary": " CPU 12% ", "status": {}})),
            Some("CPU 12%".into())
        );
        assert_eq!(
            render_output(json!({"summary": "", "ok": true})),
            Some(r#"{"ok":true,"summary":""}"#.into())
        );
        assert_eq!(render_output(json!(42)), Some("42".into()));
        assert_eq!(render_output(json!([1, "a"])), Some(r#"[1,"a"]"#.into()));
    }

    #[test]
    fn test_messages_follow_intent_order() {
        let registry = registry(&[("one", "g", "one"), ("two", "g", "two")]);
        let skills = SkillSet::new().with_group(
            SkillGroup::new("g")
                .with_nullary("one", || Ok(json!("first")))
                .with_nullary("two", || Ok(json!("second"))),
        );
        let dispatcher = Dispatcher::new(&registry, &skills);

        let messages = dispatcher.dispatch(&[
            Intent::bare("two"),
            Intent::bare("one"),
            Intent::bare("two"),
        ]);
        assert_eq!(messages, vec!["second", "first", "second"]);
    }

    #[test]
    fn test_unknown_and_unresolved_actions_skipped() {
        let registry = registry(&[
            ("ok", "g", "ok"),
            ("ghost_group", "nowhere", "ok"),
            ("ghost_handler", "g", "missing"),
        ]);
        let skills =
            SkillSet::new().with_group(SkillGroup::new("g").with_nullary("ok", || Ok(json!("done"))));
        let dispatcher = Dispatcher::new(&registry, &skills);

        let messages = dispatcher.dispatch(&[
            Intent::bare("levitate"),
            Intent::bare("ghost_group"),
            Intent::bare("ghost_handler"),
            Intent::bare("ok"),
        ]);
        assert_eq!(messages, vec!["done"]);
    }

    #[test]
    fn test_failing_and_panicking_handlers_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let registry = registry(&[
            ("fails", "g", "fails"),
            ("panics", "g", "panics"),
            ("counts", "g", "counts"),
        ]);
        let skills = SkillSet::new().with_group(
            SkillGroup::new("g")
                .with_nullary("fails", || Err(SkillError::Failed("boom".into())))
                .with_nullary("panics", || panic!("handler exploded"))
                .with_nullary("counts", move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("still here"))
                }),
        );
        let dispatcher = Dispatcher::new(&registry, &skills);

        let messages = dispatcher.dispatch(&[
            Intent::bare("fails"),
            Intent::bare("panics"),
            Intent::bare("counts"),
        ]);
        assert_eq!(messages, vec!["still here"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nullary_handler_ignores_target() {
        let registry = registry(&[("status", "g", "status")]);
        let skills = SkillSet::new()
            .with_group(SkillGroup::new("g").with_nullary("status", || Ok(json!({"summary": "All good"}))));
        let dispatcher = Dispatcher::new(&registry, &skills);

        let messages =
            dispatcher.dispatch(&[Intent::new("status", Some(Target::from("unexpected")))]);
        assert_eq!(messages, vec!["All good"]);
    }

    #[test]
    fn test_unary_handler_receives_target() {
        let registry = registry(&[("open_app", "apps", "open_app")]);
        let skills = SkillSet::new().with_group(SkillGroup::new("apps").with_unary(
            "open_app",
            |target| match target {
                Some(target) => Ok(json!(format!("Opening {}.", target))),
                None => Ok(Value::Null),
            },
        ));
        let dispatcher = Dispatcher::new(&registry, &skills);

        let messages = dispatcher.dispatch(&[
            Intent::new("open_app", Some(Target::from("chrome"))),
            Intent::bare("open_app"),
        ]);
        assert_eq!(messages, vec!["Opening chrome."]);
    }

    #[test]
    fn test_empty_registry_dispatches_nothing() {
        let registry = ActionRegistry::empty();
        let skills = SkillSet::builtin();
        let dispatcher = Dispatcher::new(&registry, &skills);
        assert!(dispatcher.dispatch(&[Intent::bare("check_status")]).is_empty());
    }
}
