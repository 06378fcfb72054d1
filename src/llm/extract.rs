//! Isolate the structured block inside raw model output
//!
//! Models wrap JSON in markdown fences, open with "Sure! Here you go:", or
//! trail off into prose after the closing brace. Extraction only ever
//! narrows the text; it never fails.

use regex::Regex;
use std::sync::OnceLock;

fn opening_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*```(?:[a-z][a-z0-9_+-]*)?\s*").expect("opening fence pattern")
    })
}

fn closing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)\s*```\s*$").expect("closing fence pattern"))
}

/// Remove markdown fence markers (```` ``` ```` or ```` ```json ````, any case)
/// and trim the result
pub fn strip_code_fences(text: &str) -> String {
    let without_open = opening_fence().replace_all(text, "");
    let without_close = closing_fence().replace_all(&without_open, "");
    without_close.trim().to_string()
}

/// Find the first `{ ... }` span whose braces balance
///
/// Braces inside JSON string literals do not count toward depth, so a reply
/// like `"I'd use {curly} braces"` does not truncate the block early.
/// Returns `None` when no opening brace exists or it is never closed.
pub fn first_balanced_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + idx + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Produce the candidate text handed to the decoder
///
/// Fences are stripped first; if a balanced block is present it is returned
/// alone, otherwise the whole (trimmed, unfenced) text is.
pub fn extract_candidate(raw: &str) -> String {
    let cleaned = strip_code_fences(raw);
    match first_balanced_block(&cleaned) {
        Some(block) => block.to_string(),
        None => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_block_unchanged() {
        let raw = r#"{"reply":"Fine.","intents":[]}"#;
        assert_eq!(extract_candidate(raw), raw);
    }

    #[test]
    fn test_fenced_block_with_trailing_prose() {
        let raw = "```json\n{\"reply\": \"ok\", \"intents\": []}\n```\nHope that helps!";
        assert_eq!(extract_candidate(raw), r#"{"reply": "ok", "intents": []}"#);
    }

    #[test]
    fn test_uppercase_fence_tag() {
        let raw = "```JSON\n{\"reply\": \"ok\"}\n```";
        assert_eq!(extract_candidate(raw), r#"{"reply": "ok"}"#);
    }

    #[test]
    fn test_leading_prose() {
        let raw = r#"Sure! Here is the JSON: {"reply": "hi", "intents": [{"action": "mute_system"}]} Bye"#;
        assert_eq!(
            extract_candidate(raw),
            r#"{"reply": "hi", "intents": [{"action": "mute_system"}]}"#
        );
    }

    #[test]
    fn test_nested_braces() {
        let raw = r#"x {"a": {"b": {"c": 1}}, "d": 2} y {"e": 3}"#;
        assert_eq!(first_balanced_block(raw), Some(r#"{"a": {"b": {"c": 1}}, "d": 2}"#));
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let raw = r#"{"reply": "use } and { freely \" }", "intents": []} trailing"#;
        assert_eq!(
            first_balanced_block(raw),
            Some(r#"{"reply": "use } and { freely \" }", "intents": []}"#)
        );
    }

    #[test]
    fn test_unbalanced_returns_trimmed_text() {
        let raw = "  {\"reply\": \"never closed\"  ";
        assert_eq!(extract_candidate(raw), "{\"reply\": \"never closed\"");
    }

    #[test]
    fn test_no_braces_returns_trimmed_text() {
        assert_eq!(extract_candidate("   just words\n"), "just words");
    }

    #[test]
    fn test_strip_fences_only() {
        assert_eq!(strip_code_fences("```\nhello\n```"), "hello");
        assert_eq!(strip_code_fences("no fences"), "no fences");
    }
}
