//! Error handling for the MCP protocol layer.
//!
//! Maps internal TickTick errors to MCP-compliant JSON-RPC error codes.

use serde_json::{json, Value};
use thiserror::Error;
use ticktick_core::TickTickError;

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("TickTick API error: {0}")]
    Api(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn to_error_code(&self) -> i32 {
        match self {
            McpError::NotFound(_) => -32001,
            McpError::Validation(_) => -32002,
            McpError::Auth(_) => -32003,
            McpError::Api(_) => -32004,
            McpError::Protocol(_) => -32005,
            McpError::Serialization(_) => -32006,
        }
    }

    /// Convert to JSON-RPC error response
    pub fn to_json_rpc_error(&self, id: Option<Value>) -> Value {
        json!({
            "jsonrpc": "2.0",
            "error": {
                "code": self.to_error_code(),
                "message": self.to_string()
            },
            "id": id
        })
    }
}

impl From<TickTickError> for McpError {
    fn from(err: TickTickError) -> Self {
        match err {
            TickTickError::NotFound(msg) => McpError::NotFound(msg),
            TickTickError::Validation(msg) => McpError::Validation(msg),
            TickTickError::Auth(msg) => McpError::Auth(msg),
            TickTickError::Api(msg) => McpError::Api(msg),
            TickTickError::Serialization(msg) => McpError::Serialization(msg),
            TickTickError::Configuration(msg) => {
                McpError::Protocol(format!("Configuration error: {msg}"))
            }
            TickTickError::Internal(msg) => McpError::Protocol(format!("Internal error: {msg}")),
        }
    }
}

impl From<anyhow::Error> for McpError {
    fn from(err: anyhow::Error) -> Self {
        // Preserve typed errors when they travel through anyhow.
        if let Some(ticktick_error) = err.downcast_ref::<TickTickError>() {
            return Self::from(ticktick_error.clone());
        }

        let error_msg = err.to_string();
        if error_msg.contains("serialize")
            || error_msg.contains("deserialize")
            || error_msg.contains("JSON")
        {
            McpError::Serialization(error_msg)
        } else if error_msg.contains("parse") || error_msg.contains("invalid") {
            McpError::Validation(error_msg)
        } else {
            McpError::Protocol(error_msg)
        }
    }
}
