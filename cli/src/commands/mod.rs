//! CLI command implementations

pub mod call;
pub mod chat;
pub mod tools;

pub use call::call_command;
pub use chat::chat_command;
pub use tools::tools_command;

use crate::config::LoadedConfig;
use crate::output::server_spinner;
use anyhow::{Context, Result};
use mcp_chat_core::McpClient;
use tracing::debug;

/// Start the configured MCP server and complete the handshake
pub(crate) async fn connect_server(config: &LoadedConfig) -> Result<McpClient> {
    let command_line = config.server.command_line();
    let spinner = server_spinner(&command_line);
    let result = McpClient::connect(&config.server, &config.identity).await;
    spinner.finish_and_clear();

    let client =
        result.with_context(|| format!("Failed to start MCP server: {}", command_line))?;
    if let Some((name, version)) = client.server_info() {
        debug!("MCP server reports {} {}", name, version);
    }
    Ok(client)
}
