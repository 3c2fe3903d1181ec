//! Render command handler.
//!
//! Renders a template the same way the server would, without starting a
//! transport. Handy when writing new templates.

use clap::Args;
use promptd_core::{config::ServerConfig, AppError, AppResult};
use promptd_prompt::{call_template_tool, get_template_prompt, load_templates, ArgValue, Registry};
use std::collections::HashMap;

/// Render one template locally
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template name
    pub name: String,

    /// Argument as key=value (repeatable)
    #[arg(short, long = "arg", value_parser = parse_key_value)]
    pub args: Vec<(String, String)>,

    /// Print the prompt projection as JSON instead of the tool text
    #[arg(long)]
    pub prompt: bool,
}

impl RenderCommand {
    pub fn execute(&self, config: &ServerConfig) -> AppResult<()> {
        tracing::info!("Executing render command");

        let registry = Registry::new();
        registry.rebuild(load_templates(&config.prompts_dir)?);

        let template = registry
            .get(&self.name)
            .ok_or_else(|| AppError::NotFound(format!("template '{}'", self.name)))?;

        if self.prompt {
            let args: HashMap<String, String> = self.args.iter().cloned().collect();
            let result = get_template_prompt(&template, &args);
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            let args: HashMap<String, ArgValue> = self
                .args
                .iter()
                .map(|(k, v)| (k.clone(), ArgValue::String(v.clone())))
                .collect();
            println!("{}", call_template_tool(&template, &args));
        }

        Ok(())
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}
