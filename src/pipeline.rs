//! One utterance cycle, from raw text to reply and dispatch messages
//!
//! ```text
//! IDLE -> EXTRACTING -> DECODING -> [REPAIRING -> DECODING]? -> NORMALIZING -> DISPATCHING -> DONE
//! ```
//!
//! Nothing from a cycle outlives it except the shared, read-only registry.
//! Callers must not run two cycles at once against the same host.

use crate::command::dispatcher::Dispatcher;
use crate::command::registry::ActionRegistry;
use crate::core::config::PipelineConfig;
use crate::core::types::Intent;
use crate::llm::client::TextGenerator;
use crate::llm::parser::Interpreter;
use crate::skills::SkillLoader;
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

/// Coarse position within a cycle, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Interpreting,
    Dispatching,
    Done,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Interpreting => "interpreting",
            CyclePhase::Dispatching => "dispatching",
            CyclePhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything the host needs after a cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub id: Uuid,
    /// Always non-empty and free of JSON punctuation
    pub reply: String,
    pub intents: Vec<Intent>,
    /// Dispatch messages in intent order; silent intents contribute nothing
    pub messages: Vec<String>,
}

pub struct Pipeline<'a, G: TextGenerator + ?Sized> {
    interpreter: Interpreter<'a, G>,
    dispatcher: Dispatcher<'a>,
}

impl<'a, G: TextGenerator + ?Sized> Pipeline<'a, G> {
    pub fn new(
        generator: &'a G,
        registry: &'a ActionRegistry,
        loader: &'a dyn SkillLoader,
        personality: impl Into<String>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            interpreter: Interpreter::new(generator, registry, personality, settings),
            dispatcher: Dispatcher::new(registry, loader),
        }
    }

    /// Run one utterance through interpretation and dispatch
    ///
    /// Infallible: every failure inside the cycle degrades to a filler reply,
    /// fewer intents or fewer messages, and is logged.
    pub async fn run_cycle(&self, utterance: &str) -> CycleOutcome {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", %id);

        async move {
            tracing::info!(phase = %CyclePhase::Interpreting, "Utterance: {}", utterance);
            let interpretation = self.interpreter.interpret(utterance).await;

            tracing::debug!(
                phase = %CyclePhase::Dispatching,
                "Dispatching {} intent(s)",
                interpretation.intents.len()
            );
            let messages = self.dispatcher.dispatch(&interpretation.intents);

            tracing::info!(
                phase = %CyclePhase::Done,
                "Reply: {} ({} message(s))",
                interpretation.reply,
                messages.len()
            );

            CycleOutcome {
                id,
                reply: interpretation.reply,
                intents: interpretation.intents,
                messages,
            }
        }
        .instrument(span)
        .await
    }
}
