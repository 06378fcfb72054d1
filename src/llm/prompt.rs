//! Prompt construction for the decide and repair round-trips

use std::path::Path;

/// Persona used when no personality file is configured or readable
pub const DEFAULT_PERSONALITY: &str =
    "You are Halo, a witty, slightly tsundere desktop assistant. You keep replies short.";

/// Output contract shared by both prompts
const OUTPUT_RULES: &str = r#"You must return ONLY a JSON object with exactly these keys:
- "reply": a short sentence to say aloud (no JSON, no code fences)
- "intents": an array of objects, each: {"action": "<valid_action_name>", "target": <string|number|null>}

RULES:
- Pick actions ONLY from the catalog. If nothing fits, return an empty intents array.
- If the user asks for several things, emit one intent per thing, in the order asked.
- Do NOT wrap the JSON in markdown fences. Do NOT add explanations.

Example:
{"reply": "Fine, opening YouTube.", "intents": [{"action": "open_website", "target": "youtube.com"}]}"#;

/// Load the persona text, falling back to [`DEFAULT_PERSONALITY`]
pub fn load_personality(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_PERSONALITY.to_string();
    };

    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!("Personality file {} is empty - using default", path.display());
            DEFAULT_PERSONALITY.to_string()
        }
        Err(e) => {
            tracing::warn!(
                "Could not read personality file {}: {} - using default",
                path.display(),
                e
            );
            DEFAULT_PERSONALITY.to_string()
        }
    }
}

/// First round-trip: interpret the utterance and reply in character
pub fn decide_prompt(personality: &str, utterance: &str, catalog: &str) -> String {
    format!(
        "{personality}\n\nUser said: \"{utterance}\"\n\n\
         VALID ACTIONS CATALOG (pick only from these 'action' names; 'target' is optional unless obvious):\n\
         {catalog}\n\n{OUTPUT_RULES}\n"
    )
}

/// Second round-trip: quote the malformed output and ask for corrected JSON only
pub fn repair_prompt(malformed: &str, catalog: &str) -> String {
    format!(
        "Your previous answer was not valid JSON. Here it is, verbatim:\n\
         <<<\n{malformed}\n>>>\n\n\
         VALID ACTIONS CATALOG:\n{catalog}\n\n\
         Rewrite it as corrected JSON. Output the JSON object and nothing else.\n\n{OUTPUT_RULES}\n"
    )
}
