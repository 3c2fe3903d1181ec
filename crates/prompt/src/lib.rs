//! Template system for promptd.
//!
//! This crate provides:
//! - YAML/JSON template definitions
//! - Recursive directory loading
//! - Literal `{{name}}` placeholder rendering
//! - Tool and prompt projections
//! - The atomically rebuilt template registry

pub mod loader;
pub mod projector;
pub mod registry;
pub mod render;
pub mod types;

// Re-export main types
pub use loader::{
    load_template_file, load_templates, parse_template, DirectorySource, TemplateFormat,
    TemplateSource, YAML_EXTENSIONS,
};
pub use projector::{
    call_template_tool, get_template_prompt, prompt_definition, tool_definition, PromptArgument,
    PromptContent, PromptDefinition, PromptMessage, PromptResult, ToolDefinition,
};
pub use registry::{Catalog, Registry};
pub use render::{render_messages, ArgValue};
pub use types::{Argument, Content, Message, Template};
