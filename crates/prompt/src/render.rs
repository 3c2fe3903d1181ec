//! Placeholder rendering for template messages.
//!
//! Rendering is a literal `{{name}}` substring replacement. It does not parse
//! nested braces, does not escape values, and never re-scans substituted
//! text. Arguments are applied in map iteration order, so when one value
//! contains another argument's placeholder the outcome is unspecified.

use crate::types::{Content, Message, Template};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An argument value received at the tool boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ArgValue::Null,
            serde_json::Value::Bool(b) => ArgValue::Bool(b),
            serde_json::Value::Number(n) => ArgValue::Number(n),
            serde_json::Value::String(s) => ArgValue::String(s),
            // Arrays and objects are carried as their JSON text
            other => ArgValue::String(other.to_string()),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => Ok(()),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Number(n) => write!(f, "{}", n),
            ArgValue::String(s) => f.write_str(s),
        }
    }
}

/// Render a template's messages with the given arguments.
///
/// Returns fresh copies; the template is left untouched. Placeholders with
/// no matching argument stay verbatim.
pub fn render_messages<V: fmt::Display>(
    template: &Template,
    args: &HashMap<String, V>,
) -> Vec<Message> {
    template
        .messages
        .iter()
        .map(|msg| Message {
            role: msg.role.clone(),
            content: Content {
                content_type: msg.content.content_type.clone(),
                text: substitute(&msg.content.text, args),
            },
        })
        .collect()
}

fn substitute<V: fmt::Display>(text: &str, args: &HashMap<String, V>) -> String {
    let mut rendered = text.to_string();
    for (name, value) in args {
        let placeholder = format!("{{{{{}}}}}", name);
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &value.to_string());
        }
    }
    rendered
}
