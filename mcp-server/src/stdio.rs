//! STDIO Transport for the MCP Server
//!
//! Implements MCP communication over stdin/stdout following the MCP
//! specification: line-based JSON-RPC 2.0 with the initialize/initialized
//! handshake, then `tools/list` and `tools/call` routing.

use anyhow::{Context, Result};
use mcp_protocol::{dispatch_tool, tool_catalog, tool_text_content, McpError, McpToolHandler};
use serde_json::{json, Value};
use std::sync::Arc;
use ticktick_core::TickTickApi;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

/// MCP protocol version implemented by this server.
const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP protocol state tracking
#[derive(Debug, PartialEq)]
enum McpState {
    /// Waiting for initialize request from client
    WaitingForInitialize,
    /// Initialize received and answered, waiting for initialized notification
    WaitingForInitialized,
    /// Fully initialized and ready to process requests
    Ready,
}

/// STDIO MCP server with protocol state management.
pub struct StdioMcpServer<A> {
    handler: McpToolHandler<A>,
    state: McpState,
}

impl<A: TickTickApi + 'static> StdioMcpServer<A> {
    /// Create a new STDIO MCP server over the given backend.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            handler: McpToolHandler::new(api),
            state: McpState::WaitingForInitialize,
        }
    }

    /// Run the server until stdin closes.
    pub async fn serve(mut self) -> Result<()> {
        info!("Starting MCP server in STDIO mode - waiting for initialize request");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("STDIN closed, shutting down MCP server");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    debug!("Received line: {}", trimmed);

                    match self.process_message(trimmed).await {
                        Ok(Some(response)) => {
                            let response_json = serde_json::to_string(&response)
                                .context("Failed to serialize JSON-RPC response")?;

                            stdout
                                .write_all(response_json.as_bytes())
                                .await
                                .context("Failed to write response to stdout")?;
                            stdout
                                .write_all(b"\n")
                                .await
                                .context("Failed to write newline to stdout")?;
                            stdout.flush().await.context("Failed to flush stdout")?;

                            debug!("Sent JSON-RPC response: {}", response_json);
                        }
                        Ok(None) => {
                            debug!("Processed notification successfully");
                        }
                        Err(e) => {
                            error!("Error processing message: {}", e);

                            let id = extract_id_from_line(trimmed);
                            let error_response = McpError::from(e).to_json_rpc_error(id);

                            let error_json = serde_json::to_string(&error_response)
                                .unwrap_or_else(|_| r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#.to_string());

                            let _ = stdout.write_all(error_json.as_bytes()).await;
                            let _ = stdout.write_all(b"\n").await;
                            let _ = stdout.flush().await;
                        }
                    }
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        info!("STDIO MCP server shutdown complete");
        Ok(())
    }

    /// Process a message - could be a request or a notification.
    async fn process_message(&mut self, line: &str) -> Result<Option<Value>> {
        let message: Value =
            serde_json::from_str(line).context("Failed to parse JSON-RPC message")?;

        if message.get("jsonrpc").and_then(|v| v.as_str()) != Some("2.0") {
            return Err(anyhow::anyhow!("Invalid JSON-RPC version"));
        }

        let method = message
            .get("method")
            .and_then(|v| v.as_str())
            .context("Missing or invalid 'method' field")?;

        let id = message.get("id").cloned();
        let params = message.get("params").unwrap_or(&Value::Null).clone();

        let is_notification = id.is_none();

        match (&self.state, method) {
            (McpState::WaitingForInitialize, "initialize") => {
                if is_notification {
                    return Err(anyhow::anyhow!(
                        "Initialize must be a request, not a notification"
                    ));
                }

                info!("Received initialize request");
                self.state = McpState::WaitingForInitialized;

                Ok(Some(json!({
                    "jsonrpc": "2.0",
                    "result": {
                        "protocolVersion": MCP_PROTOCOL_VERSION,
                        "capabilities": {
                            "tools": {
                                "listChanged": false
                            }
                        },
                        "serverInfo": {
                            "name": "ticktick-mcp",
                            "version": env!("CARGO_PKG_VERSION")
                        }
                    },
                    "id": id
                })))
            }

            (McpState::WaitingForInitialized, "notifications/initialized") => {
                if !is_notification {
                    return Err(anyhow::anyhow!(
                        "Initialized must be a notification, not a request"
                    ));
                }

                info!("Received initialized notification - server is ready");
                self.state = McpState::Ready;

                Ok(None)
            }

            (McpState::Ready, _) => {
                if is_notification {
                    match method {
                        "notifications/cancelled" => {
                            debug!("Received cancelled notification");
                            Ok(None)
                        }
                        _ => {
                            warn!("Unknown notification method: {}", method);
                            Ok(None)
                        }
                    }
                } else {
                    match self.execute_request(method, params).await {
                        Ok(result) => Ok(Some(json!({
                            "jsonrpc": "2.0",
                            "result": result,
                            "id": id
                        }))),
                        Err(mcp_error) => Ok(Some(mcp_error.to_json_rpc_error(id))),
                    }
                }
            }

            _ => Err(anyhow::anyhow!(
                "Invalid method '{}' for current state {:?}",
                method,
                self.state
            )),
        }
    }

    /// Execute a request in the Ready state.
    async fn execute_request(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<Value, McpError> {
        match method {
            "tools/list" => Ok(tool_catalog()),
            "tools/call" => {
                let tool_name = params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        McpError::Protocol("Missing tool name in tools/call".to_string())
                    })?;

                let arguments = params
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

                let payload = dispatch_tool(&self.handler, tool_name, arguments).await?;
                Ok(tool_text_content(&payload))
            }
            // Direct tool-name calls for compatibility with simple clients.
            other if other.starts_with("ticktick_") => {
                let payload = dispatch_tool(&self.handler, other, params).await?;
                Ok(tool_text_content(&payload))
            }
            other => Err(McpError::Protocol(format!("Unknown method: {other}"))),
        }
    }
}

/// Extract the ID from a malformed JSON line for error responses.
fn extract_id_from_line(line: &str) -> Option<Value> {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|json| json.get("id").cloned())
}
