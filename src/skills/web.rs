//! Browser capabilities

use super::{open_with_desktop, require_text, SkillError, SkillGroup};
use crate::core::types::Target;
use serde_json::Value;

pub fn group() -> SkillGroup {
    SkillGroup::new("web").with_unary("open_website", open_website)
}

/// Open a site in the default browser; silent, the model's reply covers it
fn open_website(target: Option<&Target>) -> Result<Value, SkillError> {
    let url = normalize_url(&require_text(target)?);
    open_with_desktop(&url)?;
    Ok(Value::Null)
}

/// Prefix bare hosts with `https://`
pub fn normalize_url(target: &str) -> String {
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}
