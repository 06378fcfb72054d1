//! Runtime configuration with documented defaults
//!
//! Loaded once at startup from a TOML file. Every field has a default so a
//! missing or partial file still yields a working assistant.

use crate::core::error::{HaloError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Upper bound on text-generation round-trips per utterance cycle
///
/// One decide call plus at most one repair call. Not configurable.
pub const MAX_GENERATION_ATTEMPTS: usize = 2;

/// Filler spoken when a configured one is missing or blank
pub const DEFAULT_FILLER_REPLY: &str = "...";

/// Top-level assistant configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HaloConfig {
    pub llm: LlmConfig,
    pub paths: PathsConfig,
    pub pipeline: PipelineConfig,
}

/// Text-generation endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Endpoint URL. The wire format is detected from it:
    /// `anthropic.com` → Anthropic messages, `/api/generate` → Ollama,
    /// anything else → OpenAI-compatible chat completions.
    pub api_url: String,

    /// Model identifier passed through to the endpoint
    pub model: String,

    /// Bearer/API key. Local Ollama needs none.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/api/generate".into(),
            model: "gemma3:4b".into(),
            api_key: None,
        }
    }
}

/// File locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Action registry source (`.toml` or `.json`)
    pub action_map: PathBuf,

    /// Persona text prepended to every decide prompt
    pub personality: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            action_map: PathBuf::from("data/action_map.toml"),
            personality: Some(PathBuf::from("data/personality.txt")),
        }
    }
}

/// Interpretation pipeline behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Spoken when nothing usable survives sanitization
    ///
    /// Must be non-empty: the host always has something to vocalize.
    pub filler_reply: String,

    /// Match "volume to N%" locally and skip the generator entirely
    pub volume_shortcut: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filler_reply: DEFAULT_FILLER_REPLY.into(),
            volume_shortcut: true,
        }
    }
}

impl HaloConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    ///
    /// A missing file is not an error: defaults are used and a warning logged.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<HaloConfig>(&content)?
        } else {
            tracing::warn!("Config file {} not found - using defaults", path.display());
            HaloConfig::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate().map_err(HaloError::ConfigError)?;
        Ok(config)
    }

    /// Apply `LLM_API_URL`, `LLM_MODEL` and `LLM_API_KEY` style overrides
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.pipeline.filler_reply.trim().is_empty() {
            return Err("pipeline.filler_reply must not be empty".into());
        }
        if self.llm.api_url.trim().is_empty() {
            return Err("llm.api_url must not be empty".into());
        }
        if self.llm.model.trim().is_empty() {
            return Err("llm.model must not be empty".into());
        }
        Ok(())
    }
}
