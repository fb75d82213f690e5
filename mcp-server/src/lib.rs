//! TickTick MCP Server Library
//!
//! Provides the pieces the `ticktick-mcp` binary is assembled from:
//! configuration management, `.env` discovery, TickTick client bootstrap
//! and the stdio JSON-RPC transport.

pub mod config;
pub mod setup;
pub mod stdio;
pub mod telemetry;

pub use config::Config;
pub use setup::{initialize_app, initialize_client, load_env_file, resolve_dotenv_dir};
pub use stdio::StdioMcpServer;
pub use telemetry::init_telemetry;
