//! Template types for promptd.
//!
//! This module defines the domain entities read from template files.

use serde::{Deserialize, Serialize};

/// A prompt template loaded from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Unique template name, used as the tool and prompt identifier
    #[serde(default)]
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Placeholder arguments, in declaration order
    #[serde(default)]
    pub arguments: Vec<Argument>,

    /// Conversation messages
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// A placeholder argument declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Informational only; values are always rendered as text
    #[serde(rename = "type", default)]
    pub arg_type: String,

    #[serde(default)]
    pub required: bool,
}

/// One message of a template conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Speaker role (e.g., "user", "assistant")
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub content: Content,
}

/// Message content.
///
/// `content_type` is either `"text"` or an image media type such as
/// `"image/png"`, in which case `text` carries the opaque image data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "type", default)]
    pub content_type: String,

    #[serde(default)]
    pub text: String,
}

impl Message {
    /// Create a message with text content.
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Content {
                content_type: "text".to_string(),
                text: text.into(),
            },
        }
    }

    /// Whether this is a user message carrying plain text.
    pub fn is_user_text(&self) -> bool {
        self.role == "user" && self.content.content_type == "text"
    }
}

impl Template {
    /// Names of the arguments flagged as required, in declaration order.
    pub fn required_arguments(&self) -> Vec<String> {
        self.arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.clone())
            .collect()
    }
}
