//! Projection of templates into tools and prompts.
//!
//! Every template is exposed twice: as a tool that returns the user text of
//! the rendered conversation, and as a prompt that returns the rendered
//! conversation itself.

use crate::render::{render_messages, ArgValue};
use crate::types::Template;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Tool-shaped description of a template or management operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Prompt-shaped description of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
}

/// One argument of a prompt definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// The rendered result of a prompt retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: PromptContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolDefinition {
    /// A tool whose input is an object of string properties.
    ///
    /// `properties` is `(name, description)` pairs; `required` is omitted
    /// from the schema when empty.
    pub fn with_string_inputs(
        name: impl Into<String>,
        description: impl Into<String>,
        properties: &[(&str, &str)],
        required: &[&str],
    ) -> Self {
        let props: Map<String, Value> = properties
            .iter()
            .map(|(prop, desc)| {
                (
                    prop.to_string(),
                    json!({ "type": "string", "description": desc }),
                )
            })
            .collect();

        let mut schema = json!({ "type": "object", "properties": props });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }

        Self {
            name: name.into(),
            description: description.into(),
            input_schema: schema,
        }
    }
}

/// Derive the tool definition of a template.
pub fn tool_definition(template: &Template) -> ToolDefinition {
    let properties: Vec<(&str, &str)> = template
        .arguments
        .iter()
        .map(|a| (a.name.as_str(), a.description.as_str()))
        .collect();
    let required: Vec<&str> = template
        .arguments
        .iter()
        .filter(|a| a.required)
        .map(|a| a.name.as_str())
        .collect();

    ToolDefinition::with_string_inputs(
        &template.name,
        &template.description,
        &properties,
        &required,
    )
}

/// Derive the prompt definition of a template.
pub fn prompt_definition(template: &Template) -> PromptDefinition {
    PromptDefinition {
        name: template.name.clone(),
        description: template.description.clone(),
        arguments: template
            .arguments
            .iter()
            .map(|a| PromptArgument {
                name: a.name.clone(),
                description: a.description.clone(),
                required: a.required,
            })
            .collect(),
    }
}

/// Invoke a template as a tool.
///
/// Joins the rendered user text messages with a blank line and trims the
/// result. A template without user text yields an empty string.
pub fn call_template_tool(template: &Template, args: &HashMap<String, ArgValue>) -> String {
    let rendered = render_messages(template, args);
    let texts: Vec<&str> = rendered
        .iter()
        .filter(|m| m.is_user_text())
        .map(|m| m.content.text.as_str())
        .collect();

    texts.join("\n\n").trim().to_string()
}

/// Retrieve a template as a prompt.
///
/// Text content is passed through, content whose type mentions `image`
/// becomes image content with the text as data, anything else is dropped.
pub fn get_template_prompt(template: &Template, args: &HashMap<String, String>) -> PromptResult {
    let messages = render_messages(template, args)
        .into_iter()
        .filter_map(|m| {
            let content = if m.content.content_type == "text" {
                PromptContent::Text {
                    text: m.content.text,
                }
            } else if m.content.content_type.contains("image") {
                PromptContent::Image {
                    data: m.content.text,
                    mime_type: m.content.content_type,
                }
            } else {
                return None;
            };
            Some(PromptMessage {
                role: m.role,
                content,
            })
        })
        .collect();

    PromptResult {
        description: template.description.clone(),
        messages,
    }
}
