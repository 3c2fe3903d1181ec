//! Transports for the prompt service.
//!
//! stdio speaks newline-delimited JSON-RPC through rmcp's stdio transport.
//! The network listener speaks MCP streamable HTTP at [`MCP_PATH`].

use crate::mcp::PromptService;
use crate::server::PromptServer;
use promptd_core::{AppError, AppResult};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use std::sync::Arc;
use tokio::net::TcpListener;

/// HTTP path the MCP endpoint is mounted on.
pub const MCP_PATH: &str = "/mcp";

/// Serve one client on stdin/stdout until it disconnects.
pub async fn serve_stdio(server: Arc<PromptServer>) -> AppResult<()> {
    tracing::info!("Serving on stdio");
    let running = PromptService::new(server)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| AppError::Protocol(format!("MCP handshake failed: {}", e)))?;

    let reason = running
        .waiting()
        .await
        .map_err(|e| AppError::Protocol(format!("MCP service task failed: {}", e)))?;
    tracing::info!("stdio session ended: {:?}", reason);
    Ok(())
}

/// Bind `addr` and serve MCP over HTTP.
///
/// A Go-style address such as `:8888` binds on all interfaces.
pub async fn serve_http(server: Arc<PromptServer>, addr: &str) -> AppResult<()> {
    let listener = TcpListener::bind(normalize_addr(addr)).await?;
    serve_http_listener(server, listener).await
}

/// Serve MCP over HTTP on an already bound listener.
pub async fn serve_http_listener(server: Arc<PromptServer>, listener: TcpListener) -> AppResult<()> {
    let service = StreamableHttpService::new(
        move || Ok(PromptService::new(Arc::clone(&server))),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );
    let router = axum::Router::new().nest_service(MCP_PATH, service);

    tracing::info!("Listening on http://{}{}", listener.local_addr()?, MCP_PATH);
    axum::serve(listener, router).await?;
    Ok(())
}

/// Turn `:port` into `0.0.0.0:port`; other addresses pass through.
pub fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}
