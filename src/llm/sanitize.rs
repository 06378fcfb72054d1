//! Make a reply safe to speak aloud
//!
//! Whatever ends up here is handed to text-to-speech, so it must never read
//! out JSON punctuation. The result is always non-empty.

use crate::llm::extract::{first_balanced_block, strip_code_fences};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const BRACKETS: [char; 4] = ['{', '}', '[', ']'];

fn reply_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""reply"\s*:\s*"((?:[^"\\]|\\.)+)""#).expect("reply field pattern")
    })
}

/// Sanitize `text` for speech, substituting `filler` when nothing is left
///
/// If structural brackets survive fence stripping, the reply is assumed to be
/// an accidentally echoed JSON document and its `reply` field is recovered;
/// failing that the brackets are simply removed.
pub fn sanitize_reply(text: &str, filler: &str) -> String {
    let stripped = strip_code_fences(text);

    let candidate = if stripped.contains(BRACKETS) {
        match reply_from_block(&stripped).or_else(|| scan_reply_field(&stripped)) {
            Some(reply) => reply,
            None => stripped,
        }
    } else {
        stripped
    };

    let spoken = remove_brackets(&candidate);
    let spoken = spoken.trim();
    if spoken.is_empty() {
        filler.to_string()
    } else {
        spoken.to_string()
    }
}

/// Pull a `"reply": "..."` value out of text that is not valid JSON
///
/// JSON escapes in the captured value are decoded when possible.
pub fn scan_reply_field(text: &str) -> Option<String> {
    let captured = reply_field().captures(text)?.get(1)?.as_str();
    let decoded = serde_json::from_str::<String>(&format!("\"{}\"", captured))
        .unwrap_or_else(|_| captured.to_string());
    let decoded = decoded.trim();
    (!decoded.is_empty()).then(|| decoded.to_string())
}

fn reply_from_block(text: &str) -> Option<String> {
    let block = first_balanced_block(text)?;
    let value: Value = serde_json::from_str(block).ok()?;
    value
        .get("reply")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

fn remove_brackets(text: &str) -> String {
    text.chars().filter(|c| !BRACKETS.contains(c)).collect()
}
