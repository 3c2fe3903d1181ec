//! Command handlers for promptd.

pub mod list;
pub mod render;
pub mod serve;

// Re-export command types for convenience
pub use list::ListCommand;
pub use render::RenderCommand;
pub use serve::ServeCommand;
