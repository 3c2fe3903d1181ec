//! List command handler.

use clap::Args;
use promptd_core::{config::ServerConfig, AppResult};
use promptd_prompt::{load_templates, Registry};

/// List the templates found in the prompts directory
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub fn execute(&self, config: &ServerConfig) -> AppResult<()> {
        tracing::info!("Executing list command");

        let registry = Registry::new();
        registry.rebuild(load_templates(&config.prompts_dir)?);

        if self.json {
            let prompts = registry.catalog().prompts;
            println!("{}", serde_json::to_string_pretty(&prompts)?);
            return Ok(());
        }

        for prompt in registry.catalog().prompts {
            if prompt.description.is_empty() {
                println!("{}", prompt.name);
            } else {
                println!("{} - {}", prompt.name, prompt.description);
            }
        }

        Ok(())
    }
}
