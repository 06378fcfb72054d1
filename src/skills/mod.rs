//! Capability groups and the handlers ("skills") they expose
//!
//! A skill performs one side effect (open an app, change the volume) and
//! optionally reports back. Skills are grouped by capability; the dispatcher
//! reaches them through a [`SkillLoader`] using the group/handler pair named
//! in the action registry.
//!
//! Each skill declares its [`Arity`] when it is registered, so the dispatcher
//! knows up front whether to pass the intent's target.

pub mod apps;
pub mod monitoring;
pub mod system;
pub mod web;

use crate::core::types::Target;
use ahash::AHashMap;
use serde_json::Value;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("{0}")]
    Failed(String),

    #[error("a target is required")]
    MissingTarget,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ExitStatus {
        program: String,
        status: std::process::ExitStatus,
    },

    #[error("not supported on {0}")]
    Unsupported(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("capability group '{0}' not found")]
    GroupNotFound(String),

    #[error("handler '{handler}' not found in capability group '{group}'")]
    HandlerNotFound { group: String, handler: String },
}

/// Whether a skill takes the intent's target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Never receives a target, even if the intent carries one
    Nullary,
    /// Receives the target (`None` when the intent has none)
    Unary,
}

/// A capability handler
///
/// The returned value is turned into a spoken/HUD message by the dispatcher:
/// `null` is silent, a string is used as-is, an object's `"summary"` string
/// is preferred over its compact JSON form.
pub trait Skill: Send + Sync {
    fn arity(&self) -> Arity;
    fn invoke(&self, target: Option<&Target>) -> Result<Value, SkillError>;
}

type NullaryFn = Box<dyn Fn() -> Result<Value, SkillError> + Send + Sync>;
type UnaryFn = Box<dyn Fn(Option<&Target>) -> Result<Value, SkillError> + Send + Sync>;

/// Skill backed by a closure
pub enum FnSkill {
    Nullary(NullaryFn),
    Unary(UnaryFn),
}

impl Skill for FnSkill {
    fn arity(&self) -> Arity {
        match self {
            FnSkill::Nullary(_) => Arity::Nullary,
            FnSkill::Unary(_) => Arity::Unary,
        }
    }

    fn invoke(&self, target: Option<&Target>) -> Result<Value, SkillError> {
        match self {
            FnSkill::Nullary(f) => f(),
            FnSkill::Unary(f) => f(target),
        }
    }
}

/// A named table of skills
pub struct SkillGroup {
    name: String,
    skills: AHashMap<String, Box<dyn Skill>>,
}

impl SkillGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skills: AHashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_skill(mut self, name: impl Into<String>, skill: impl Skill + 'static) -> Self {
        self.skills.insert(name.into(), Box::new(skill));
        self
    }

    pub fn with_nullary<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Value, SkillError> + Send + Sync + 'static,
    {
        self.with_skill(name, FnSkill::Nullary(Box::new(f)))
    }

    pub fn with_unary<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Target>) -> Result<Value, SkillError> + Send + Sync + 'static,
    {
        self.with_skill(name, FnSkill::Unary(Box::new(f)))
    }

    pub fn get(&self, name: &str) -> Option<&dyn Skill> {
        self.skills.get(name).map(|skill| skill.as_ref())
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Resolves a capability group, then a handler inside it
pub trait SkillLoader {
    fn resolve(&self, group: &str, handler: &str) -> Result<&dyn Skill, ResolveError>;
}

/// The set of capability groups available to the dispatcher
#[derive(Default)]
pub struct SkillSet {
    groups: AHashMap<String, SkillGroup>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every group shipped with the crate
    pub fn builtin() -> Self {
        Self::new()
            .with_group(apps::group())
            .with_group(web::group())
            .with_group(system::group())
            .with_group(monitoring::group())
    }

    /// Add a group, replacing any existing group of the same name
    pub fn with_group(mut self, group: SkillGroup) -> Self {
        self.groups.insert(group.name().to_string(), group);
        self
    }

    pub fn group(&self, name: &str) -> Option<&SkillGroup> {
        self.groups.get(name)
    }
}

impl SkillLoader for SkillSet {
    fn resolve(&self, group: &str, handler: &str) -> Result<&dyn Skill, ResolveError> {
        let skills = self
            .group(group)
            .ok_or_else(|| ResolveError::GroupNotFound(group.to_string()))?;
        skills.get(handler).ok_or_else(|| ResolveError::HandlerNotFound {
            group: group.to_string(),
            handler: handler.to_string(),
        })
    }
}

/// Text form of a required target
pub(crate) fn require_text(target: Option<&Target>) -> Result<String, SkillError> {
    match target {
        Some(target) => {
            let text = target.to_string();
            let text = text.trim();
            if text.is_empty() {
                Err(SkillError::MissingTarget)
            } else {
                Ok(text.to_string())
            }
        }
        None => Err(SkillError::MissingTarget),
    }
}

/// Run a program to completion, discarding its output
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<(), SkillError> {
    tracing::debug!("Running {} {:?}", program, args);
    let status = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| SkillError::Launch {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(SkillError::ExitStatus {
            program: program.to_string(),
            status,
        })
    }
}

/// Start a program without waiting for it
pub(crate) fn spawn_detached(program: &str, args: &[&str]) -> Result<(), SkillError> {
    tracing::debug!("Spawning {} {:?}", program, args);
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|source| SkillError::Launch {
            program: program.to_string(),
            source,
        })
}

/// Hand a URL or document to the desktop's default opener
pub(crate) fn open_with_desktop(resource: &str) -> Result<(), SkillError> {
    if cfg!(target_os = "windows") {
        spawn_detached("cmd", &["/C", "start", "", resource])
    } else if cfg!(target_os = "macos") {
        spawn_detached("open", &[resource])
    } else {
        spawn_detached("xdg-open", &[resource])
    }
}
