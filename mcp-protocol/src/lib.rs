//! MCP protocol layer for the TickTick server.
//!
//! Bridges MCP tool calls to a [`ticktick_core::TickTickApi`] backend:
//!
//! - [`handler`] - tool implementations
//! - [`tools`] - tool catalog (`tools/list`) and name-based dispatch
//! - [`serialization`] - content-block wrapping and error payloads
//! - [`trim`] - response slimming for task listings
//! - [`error`] - JSON-RPC error code mapping

pub mod error;
pub mod handler;
pub mod serialization;
pub mod tools;
pub mod trim;

pub use error::McpError;
pub use handler::McpToolHandler;
pub use serialization::{
    create_success_response, deserialize_mcp_params, error_payload, format_response,
    tool_text_content,
};
pub use tools::{dispatch_tool, tool_catalog};
pub use trim::{trim_task, trim_tasks};
