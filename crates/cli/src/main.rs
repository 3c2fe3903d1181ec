//! promptd
//!
//! Serves a directory of prompt templates as Model Context Protocol tools
//! and prompts.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ListCommand, RenderCommand, ServeCommand};
use promptd_core::{config::ServerConfig, logging, AppResult};
use std::path::PathBuf;

/// promptd - serve prompt templates over the Model Context Protocol
#[derive(Parser, Debug)]
#[command(name = "promptd")]
#[command(about = "Serve prompt templates as MCP tools and prompts", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory scanned recursively for template files
    #[arg(short = 'd', long, global = true, env = "PROMPTD_PROMPTS_DIR")]
    prompts_dir: Option<PathBuf>,

    /// Text file returned by the get_prompt_generate_rule tool
    #[arg(long, global = true, env = "PROMPTD_RULE_FILE")]
    rule_file: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PROMPTD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve templates on stdio or over HTTP
    Serve(ServeCommand),

    /// List the templates found in the prompts directory
    List(ListCommand),

    /// Render one template locally
    Render(RenderCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let (addr, stdio) = match &cli.command {
        Commands::Serve(cmd) => (cmd.addr.clone(), cmd.stdio),
        _ => (None, false),
    };

    let config = ServerConfig::load_from(cli.config)?.with_overrides(
        cli.prompts_dir,
        cli.rule_file,
        addr,
        stdio,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("promptd starting");
    tracing::debug!("Prompts directory: {:?}", config.prompts_dir);
    tracing::debug!("Rule file: {:?}", config.rule_file);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::List(_) => "list",
        Commands::Render(_) => "render",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::List(cmd) => cmd.execute(&config),
        Commands::Render(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
