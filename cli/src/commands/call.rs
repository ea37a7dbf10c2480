//! Single tool invocation command

use super::connect_server;
use crate::config::CliConfigLoader;
use anyhow::{bail, Context, Result};
use mcp_chat_core::ToolProvider;
use serde_json::Value;
use tracing::debug;

/// Call one MCP tool and print what it returned
pub async fn call_command(
    config_loader: CliConfigLoader,
    tool: String,
    arguments: String,
) -> Result<()> {
    let arguments = parse_arguments(&arguments)?;
    let config = config_loader.load().await?;
    let client = connect_server(&config).await?;

    debug!("Calling '{}' with {}", tool, arguments);
    let outcome = client.call_tool(&tool, arguments).await;
    client.shutdown().await;
    let result = outcome.with_context(|| format!("Tool call failed: {}", tool))?;

    println!("{}", result.render());
    if result.is_error {
        bail!("Tool '{}' reported an error", tool);
    }
    Ok(())
}

fn parse_arguments(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("Tool arguments are not valid JSON: {}", raw))?;
    if !(value.is_object() || value.is_null()) {
        bail!("Tool arguments must be a JSON object");
    }
    Ok(value)
}
