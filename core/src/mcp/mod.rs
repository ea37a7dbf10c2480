//! MCP (Model Context Protocol) tool provider client
//!
//! Framing, the handshake and the stdio transport come from `rmcp`. This
//! module adds process launch from [`McpServerConfig`](crate::config::McpServerConfig),
//! a crate-local view of tools and results, and the adapter that exposes
//! server tools to the model.

pub mod client;
pub mod function;
pub mod types;

pub use client::McpClient;
pub use function::McpFunction;
pub use types::{McpCallResult, McpContent, McpToolInfo, ToolProvider};
