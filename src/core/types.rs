//! Core types shared by the interpretation and dispatch layers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Argument attached to an intent
///
/// Language models emit strings, numbers, or null here. Anything else they
/// produce (booleans, nested structures) is carried as its compact JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Target {
    /// Convert a decoded JSON value into a target; `null` yields `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Target::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Target::Integer(i)),
                None => n.as_f64().map(Target::Float),
            },
            Value::Bool(b) => Some(Target::Text(b.to_string())),
            other => Some(Target::Text(other.to_string())),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Target::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Integer(i) => write!(f, "{}", i),
            Target::Float(x) => write!(f, "{}", x),
            Target::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Text(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::Text(s)
    }
}

impl From<i64> for Target {
    fn from(i: i64) -> Self {
        Target::Integer(i)
    }
}

/// A canonical intent, ready for dispatch
///
/// `action` is never empty once an intent has left the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    pub target: Option<Target>,
}

impl Intent {
    pub fn new(action: impl Into<String>, target: Option<Target>) -> Self {
        Self {
            action: action.into(),
            target,
        }
    }

    /// Intent without an argument
    pub fn bare(action: impl Into<String>) -> Self {
        Self::new(action, None)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}({})", self.action, target),
            None => write!(f, "{}()", self.action),
        }
    }
}

/// Result of interpreting one utterance: what to say and what to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Sanitized, speakable reply
    pub reply: String,
    /// Canonical intents in the order the model produced them
    pub intents: Vec<Intent>,
}
