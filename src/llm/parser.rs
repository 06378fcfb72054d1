//! Turn an utterance into a speakable reply and canonical intents
//!
//! The model is asked for a JSON object `{"reply", "intents"}`. Its answer is
//! cut down to the first balanced block and decoded; if that fails the model
//! gets exactly one chance to repair its own output. Whatever happens, the
//! caller receives a non-empty reply and a (possibly empty) intent list.

use crate::command::normalize::{clamp_volume, normalize_intents, SET_VOLUME};
use crate::command::registry::ActionRegistry;
use crate::core::config::{PipelineConfig, DEFAULT_FILLER_REPLY, MAX_GENERATION_ATTEMPTS};
use crate::core::types::{Intent, Interpretation, Target};
use crate::llm::client::TextGenerator;
use crate::llm::decode::{decode, StructuredResponse};
use crate::llm::extract::extract_candidate;
use crate::llm::prompt::{decide_prompt, repair_prompt};
use crate::llm::sanitize::{sanitize_reply, scan_reply_field};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn volume_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"volume\s*(to)?\s*(\d{1,3})\s*%?").expect("volume pattern"))
}

/// Recognize "volume to N%" without asking the model
pub fn volume_shortcut(utterance: &str) -> Option<Intent> {
    let lowered = utterance.to_lowercase();
    let level: i64 = volume_pattern()
        .captures(&lowered)?
        .get(2)?
        .as_str()
        .parse()
        .ok()?;
    Some(Intent::new(SET_VOLUME, Some(clamp_volume(Target::Integer(level)))))
}

/// Drives the decide/repair round-trips against a [`TextGenerator`]
pub struct Interpreter<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
    catalog: String,
    personality: String,
    settings: PipelineConfig,
}

impl<'a, G: TextGenerator + ?Sized> Interpreter<'a, G> {
    /// A blank `filler_reply` in `settings` is replaced by [`DEFAULT_FILLER_REPLY`]
    pub fn new(
        generator: &'a G,
        registry: &ActionRegistry,
        personality: impl Into<String>,
        mut settings: PipelineConfig,
    ) -> Self {
        if settings.filler_reply.trim().is_empty() {
            tracing::warn!("Blank filler reply configured, using {:?}", DEFAULT_FILLER_REPLY);
            settings.filler_reply = DEFAULT_FILLER_REPLY.to_string();
        }

        Self {
            generator,
            catalog: registry.catalog_json(),
            personality: personality.into(),
            settings,
        }
    }

    /// Interpret one utterance
    ///
    /// Never fails. At most [`MAX_GENERATION_ATTEMPTS`] generator calls are
    /// made; a generator error ends the attempts early.
    pub async fn interpret(&self, utterance: &str) -> Interpretation {
        if self.settings.volume_shortcut {
            if let Some(intent) = volume_shortcut(utterance) {
                tracing::info!("Volume shortcut matched: {}", intent);
                let reply = match &intent.target {
                    Some(level) => format!("Setting volume to {}%.", level),
                    None => String::new(),
                };
                return Interpretation {
                    reply: sanitize_reply(&reply, &self.settings.filler_reply),
                    intents: vec![intent],
                };
            }
        }

        let response = self.generate_structured(utterance).await;
        let reply = sanitize_reply(&response.reply, &self.settings.filler_reply);
        let intents = normalize_intents(&response.intents);
        tracing::debug!("Interpreted {} intent(s)", intents.len());

        Interpretation { reply, intents }
    }

    async fn generate_structured(&self, utterance: &str) -> StructuredResponse {
        let mut outputs: Vec<String> = Vec::with_capacity(MAX_GENERATION_ATTEMPTS);

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let prompt = match outputs.last() {
                None => decide_prompt(&self.personality, utterance, &self.catalog),
                Some(malformed) => {
                    tracing::info!("Asking the model to repair its output");
                    repair_prompt(malformed, &self.catalog)
                }
            };

            let raw = match self.generator.generate(&prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Generation attempt {} failed: {}", attempt, e);
                    break;
                }
            };

            match decode(&extract_candidate(&raw)) {
                Ok(response) => return response,
                Err(e) => {
                    tracing::warn!("Attempt {} produced undecodable output: {}", attempt, e);
                    tracing::debug!("Raw output: {}", raw);
                    outputs.push(raw);
                }
            }
        }

        // Best effort: a reply field may still be readable in the broken text
        let reply = outputs
            .iter()
            .rev()
            .find_map(|raw| scan_reply_field(raw))
            .unwrap_or_default();

        StructuredResponse {
            reply,
            intents: Value::Null,
        }
    }
}
