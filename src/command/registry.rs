//! Action registry: which capability handler serves which action
//!
//! Loaded once at startup from a declarative action map (TOML or JSON) and
//! never mutated afterwards. Each entry may be written in one of three
//! encodings; all of them are parsed into a single [`RegistryEntry`] here,
//! so malformed entries are rejected at load time rather than on every
//! dispatch.
//!
//! ```toml
//! open_app      = ["apps", "open_app"]
//! check_status  = { module = "monitoring", function = "check_status", description = "CPU/RAM/disk snapshot" }
//! open_website  = "web.open_website"
//! ```

use crate::skills::{ResolveError, SkillLoader};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON action map: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML action map: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported action map format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid map entry for '{action}': {reason}")]
    InvalidEntry { action: String, reason: String },
}

/// A capability group plus a handler name inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    pub group: String,
    pub handler: String,
}

impl HandlerRef {
    pub fn new(group: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            handler: handler.into(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.handler)
    }
}

/// Which of the accepted encodings an entry was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEncoding {
    /// `["group", "handler"]`
    Pair,
    /// `{ module = "group", function = "handler" }`
    Keyed,
    /// `"group.handler"`
    Dotted,
}

/// One action → handler mapping, whatever its source encoding
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub handler: HandlerRef,
    pub description: Option<String>,
    pub encoding: EntryEncoding,
}

impl RegistryEntry {
    pub fn new(group: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            handler: HandlerRef::new(group, handler),
            description: None,
            encoding: EntryEncoding::Keyed,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse one action map value in any of the three encodings
    pub fn parse(action: &str, value: &Value) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidEntry {
            action: action.to_string(),
            reason,
        };

        let (group, handler, description, encoding) = match value {
            Value::Array(items) => match items.as_slice() {
                [Value::String(group), Value::String(handler)] => {
                    (group.as_str(), handler.as_str(), None, EntryEncoding::Pair)
                }
                _ => return Err(invalid(format!("expected [group, handler], got {}", value))),
            },
            Value::Object(map) => {
                let field = |key: &str| map.get(key).and_then(Value::as_str);
                match (field("module"), field("function")) {
                    (Some(module), Some(function)) => (
                        module,
                        function,
                        field("description").or_else(|| field("desc")),
                        EntryEncoding::Keyed,
                    ),
                    _ => {
                        return Err(invalid(format!(
                            "expected string 'module' and 'function' keys, got {}",
                            value
                        )))
                    }
                }
            }
            Value::String(path) => match path.rsplit_once('.') {
                Some((group, handler)) => (group, handler, None, EntryEncoding::Dotted),
                None => {
                    return Err(invalid(format!(
                        "'{}' is not a dotted group.handler path",
                        path
                    )))
                }
            },
            other => return Err(invalid(format!("unrecognized shape {}", other))),
        };

        let group = group.trim();
        let handler = handler.trim();
        if group.is_empty() || handler.is_empty() {
            return Err(invalid("group and handler names must be non-empty".into()));
        }

        Ok(Self {
            handler: HandlerRef::new(group, handler),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            encoding,
        })
    }
}

/// Immutable action → handler table
#[derive(Debug, Default)]
pub struct ActionRegistry {
    entries: BTreeMap<String, RegistryEntry>,
    rejected: Vec<RegistryError>,
}

impl ActionRegistry {
    /// Registry with no actions: the assistant replies but never acts
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the action map at `path`, degrading to an empty registry
    ///
    /// A missing or unreadable file is logged, never fatal.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!(
                "No action map at {} - actions will never dispatch",
                path.display()
            );
            return Self::empty();
        }

        match Self::try_load(path) {
            Ok(registry) => {
                tracing::info!(
                    "Loaded {} action(s) from {} ({} rejected)",
                    registry.len(),
                    path.display(),
                    registry.rejected.len()
                );
                registry
            }
            Err(e) => {
                tracing::error!("Failed to load action map: {} - actions will never dispatch", e);
                Self::empty()
            }
        }
    }

    /// Load the action map at `path`, choosing the parser from its extension
    pub fn try_load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(RegistryError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let raw: BTreeMap<String, Value> = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_json_str(content: &str) -> Result<Self, RegistryError> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: BTreeMap<String, Value>) -> Self {
        let mut registry = Self::empty();

        for (action, value) in raw {
            match RegistryEntry::parse(&action, &value) {
                Ok(entry) => {
                    registry.entries.insert(action, entry);
                }
                Err(e) => {
                    tracing::warn!("Skipping action map entry: {}", e);
                    registry.rejected.push(e);
                }
            }
        }

        registry
    }

    pub fn get(&self, action: &str) -> Option<&RegistryEntry> {
        self.entries.get(action)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Action names in sorted order
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries dropped at load time, with the reason for each
    pub fn rejected(&self) -> &[RegistryError] {
        &self.rejected
    }

    /// Compact JSON list of `{"action", "description"?}` for prompts
    pub fn catalog_json(&self) -> String {
        let items: Vec<Value> = self
            .entries
            .iter()
            .map(|(action, entry)| {
                let mut item = serde_json::Map::new();
                item.insert("action".into(), Value::String(action.clone()));
                if let Some(description) = &entry.description {
                    item.insert("description".into(), Value::String(description.clone()));
                }
                Value::Object(item)
            })
            .collect();
        Value::Array(items).to_string()
    }

    /// Entries whose handler the loader cannot resolve
    ///
    /// Intended for a startup diagnostic; dispatch still skips them safely.
    pub fn unresolved<'a>(&'a self, loader: &dyn SkillLoader) -> Vec<(&'a str, ResolveError)> {
        self.entries
            .iter()
            .filter_map(|(action, entry)| {
                loader
                    .resolve(&entry.handler.group, &entry.handler.handler)
                    .err()
                    .map(|e| (action.as_str(), e))
            })
            .collect()
    }
}

impl FromIterator<(String, RegistryEntry)> for ActionRegistry {
    fn from_iter<I: IntoIterator<Item = (String, RegistryEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            rejected: Vec::new(),
        }
    }
}
