//! Model Context Protocol surface of the prompt server.
//!
//! [`PromptService`] implements the rmcp [`ServerHandler`] over a shared
//! [`PromptServer`]. Tool and prompt definitions are taken from the live
//! registry on every list request, and a successful reload or add tells the
//! connected client that both lists changed.

use crate::server::{PromptServer, ADD_PROMPT, RELOAD_PROMPTS};
use promptd_core::AppError;
use promptd_prompt::ArgValue;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, GetPromptResult,
    Implementation, ListPromptsResult, ListToolsResult, PaginatedRequestParam, Prompt,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub const SERVER_NAME: &str = "promptd";

/// rmcp handler exposing templates as tools and prompts.
#[derive(Debug, Clone)]
pub struct PromptService {
    server: Arc<PromptServer>,
}

impl PromptService {
    pub fn new(server: Arc<PromptServer>) -> Self {
        Self { server }
    }

    async fn notify_lists_changed(&self, context: &RequestContext<RoleServer>) {
        if let Err(e) = context.peer.notify_tool_list_changed().await {
            tracing::warn!("Failed to send tools/list_changed: {}", e);
        }
        if let Err(e) = context.peer.notify_prompt_list_changed().await {
            tracing::warn!("Failed to send prompts/list_changed: {}", e);
        }
    }
}

impl ServerHandler for PromptService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Prompt templates served as tools and prompts. Use get_prompt_names to list them, \
                 add_prompt to create one and reload_prompts after editing files on disk."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .enable_prompts()
                .enable_prompts_list_changed()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self
            .server
            .list_tools()
            .iter()
            .map(to_model::<Tool, _>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        let args: HashMap<String, ArgValue> = request
            .arguments
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, ArgValue::from(v)))
            .collect();

        // Management tools touch the filesystem
        let server = Arc::clone(&self.server);
        let tool = name.clone();
        let outcome = tokio::task::spawn_blocking(move || server.call_tool(&tool, &args))
            .await
            .map_err(|e| McpError::internal_error(format!("tool handler panicked: {}", e), None))?;

        match outcome {
            Ok(text) => {
                if name == RELOAD_PROMPTS || name == ADD_PROMPT {
                    self.notify_lists_changed(&context).await;
                }
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(AppError::NotFound(what)) => {
                Err(McpError::invalid_params(format!("Unknown {}", what), None))
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompts = self
            .server
            .list_prompts()
            .iter()
            .map(to_model::<Prompt, _>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let args: HashMap<String, String> = request
            .arguments
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, ArgValue::from(v).to_string()))
            .collect();

        match self.server.get_prompt(&request.name, &args) {
            Ok(result) => to_model(&result),
            Err(AppError::NotFound(what)) => {
                Err(McpError::invalid_params(format!("Unknown {}", what), None))
            }
            Err(e) => Err(McpError::internal_error(e.to_string(), None)),
        }
    }
}

/// Convert a projection into the matching rmcp model type.
///
/// Both sides share the MCP wire shape, so the conversion goes through JSON.
/// A failure is a server fault, such as a template message whose role the
/// protocol does not know.
fn to_model<T, S>(value: &S) -> Result<T, McpError>
where
    T: DeserializeOwned,
    S: Serialize,
{
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| McpError::internal_error(format!("failed to build response: {}", e), None))
}
