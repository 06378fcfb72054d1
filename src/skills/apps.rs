//! Launch desktop applications by name

use super::{open_with_desktop, require_text, spawn_detached, SkillError, SkillGroup};
use crate::core::types::Target;
use serde_json::{json, Value};

/// Names people say that really mean a website
const WEBSITE_ALIASES: [(&str, &str); 4] = [
    ("youtube", "https://www.youtube.com"),
    ("google", "https://www.google.com"),
    ("github", "https://github.com"),
    ("reddit", "https://www.reddit.com"),
];

pub fn group() -> SkillGroup {
    SkillGroup::new("apps").with_unary("open_app", open_app)
}

fn open_app(target: Option<&Target>) -> Result<Value, SkillError> {
    let name = require_text(target)?;

    match website_alias(&name) {
        Some(url) => open_with_desktop(url)?,
        None => launch_app(&name)?,
    }

    Ok(json!(format!("Opening {}.", name)))
}

/// URL for a website alias, matched case-insensitively
pub fn website_alias(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    WEBSITE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, url)| *url)
}

fn launch_app(name: &str) -> Result<(), SkillError> {
    if cfg!(target_os = "windows") {
        spawn_detached("cmd", &["/C", "start", "", name])
    } else if cfg!(target_os = "macos") {
        spawn_detached("open", &["-a", name])
    } else {
        let program = name.to_lowercase();
        spawn_detached(&program, &[])
    }
}
