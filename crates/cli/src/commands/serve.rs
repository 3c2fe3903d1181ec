//! Serve command handler.
//!
//! Loads the templates and serves them until the transport closes or the
//! process receives Ctrl-C.

use clap::Args;
use promptd_core::{config::ServerConfig, AppResult};
use promptd_server::{transport, PromptServer};
use std::sync::Arc;

/// Serve templates over MCP
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// HTTP listen address (e.g. ":8888" or "127.0.0.1:8888"); stdio when unset
    #[arg(long, env = "PROMPTD_ADDR")]
    pub addr: Option<String>,

    /// Force the stdio transport even if an address is configured
    #[arg(long)]
    pub stdio: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config: &ServerConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        // A failed first load aborts startup
        let server = Arc::new(PromptServer::new(&config.prompts_dir, &config.rule_file)?);
        tracing::info!(
            "Starting prompt server with {} prompts",
            server.registry().len()
        );

        let serve = async {
            match config.addr.as_deref() {
                Some(addr) => transport::serve_http(Arc::clone(&server), addr).await,
                None => transport::serve_stdio(Arc::clone(&server)).await,
            }
        };

        tokio::select! {
            result = serve => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
                Ok(())
            }
        }
    }
}
