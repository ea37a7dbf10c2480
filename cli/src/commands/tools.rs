//! Tools listing command

use super::connect_server;
use crate::config::CliConfigLoader;
use crate::output::print_tools;
use anyhow::Result;
use tracing::info;

/// Show the tools exposed by the MCP server
pub async fn tools_command(config_loader: CliConfigLoader) -> Result<()> {
    let config = config_loader.load().await?;
    let client = connect_server(&config).await?;

    let listed = client.list_tools().await;
    client.shutdown().await;
    let tools = listed?;

    info!("Listing {} tools from '{}'", tools.len(), config.server.id);
    print_tools(&mut std::io::stdout().lock(), &tools)?;
    Ok(())
}
