//! Decode a candidate block into the reply/intents shape

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAMapping(&'static str),
}

/// The model's response after decoding, before intent normalization
///
/// `intents` is left as raw JSON: the normalizer owns the job of making sense
/// of the many shapes models produce.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResponse {
    /// `reply` field if it was a string, otherwise empty
    pub reply: String,
    /// `intents` field if it was an array or a single object, otherwise `Null`
    pub intents: Value,
}

/// Parse `candidate` as JSON and pull out `reply` and `intents`
///
/// Fails only when the text is not JSON or the top level is not an object.
/// Missing or mistyped fields degrade to empty values.
pub fn decode(candidate: &str) -> Result<StructuredResponse, DecodeError> {
    let value: Value = serde_json::from_str(candidate)?;

    let mut map = match value {
        Value::Object(map) => map,
        other => return Err(DecodeError::NotAMapping(kind_of(&other))),
    };

    let reply = match map.remove("reply") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let intents = match map.remove("intents") {
        Some(v @ (Value::Array(_) | Value::Object(_))) => v,
        _ => Value::Null,
    };

    Ok(StructuredResponse { reply, intents })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
