//! promptd server crate.
//!
//! Wires the template registry to the outside world:
//! - `server`: management operations and live tool/prompt dispatch
//! - `mcp`: the Model Context Protocol handler built on rmcp
//! - `transport`: stdio and streamable HTTP transports
//!
//! # Example
//! ```no_run
//! use promptd_server::{transport, PromptServer};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Arc::new(PromptServer::new("prompts", "generate_rule.txt")?);
//! transport::serve_stdio(server).await?;
//! # Ok(())
//! # }
//! ```

pub mod mcp;
pub mod server;
pub mod transport;

// Re-export main types
pub use mcp::{PromptService, SERVER_NAME};
pub use server::{PromptServer, MANAGEMENT_TOOLS};
