//! # mcp-chat CLI
//!
//! Command-line interface for mcp-chat: chat with an OpenAI model that can
//! call the tools of an MCP server.
//!
//! ## Usage
//!
//! - `mcp-chat` - List tools, run the echo check and the sample prompt, then chat
//! - `mcp-chat tools` - Show the tools exposed by the MCP server
//! - `mcp-chat call echo --arguments '{"message":"hi"}'` - Call a single tool
//!
//! The MCP server defaults to `npx -y @modelcontextprotocol/server-everything`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{call_command, chat_command, tools_command};
use config::CliConfigLoader;

/// mcp-chat - Chat with an LLM that can call MCP tools
#[derive(Parser)]
#[command(name = "mcp-chat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with an OpenAI model that can call the tools of an MCP server")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./mcp-chat.json when present)
    #[arg(short, long, global = true, env = "MCP_CHAT_CONFIG")]
    config: Option<PathBuf>,

    /// API key override
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// MCP server executable
    #[arg(long, global = true)]
    server_command: Option<String>,

    /// MCP server argument (repeat for several)
    #[arg(long = "server-arg", global = true, allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo and the chat loop (default)
    Chat,

    /// Show the tools exposed by the MCP server
    Tools,

    /// Call one tool and print its result
    Call {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        arguments: String,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(command) = &cli.server_command {
        loader = loader.with_server_command_override(command.clone());
    }

    if !cli.server_args.is_empty() {
        loader = loader.with_server_args_override(cli.server_args.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    mcp_chat_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match cli.command {
        Some(Commands::Tools) => tools_command(config_loader).await,
        Some(Commands::Call { tool, arguments }) => {
            call_command(config_loader, tool, arguments).await
        }
        Some(Commands::Chat) | None => chat_command(config_loader).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_call_with_server_args() {
        let cli = Cli::parse_from([
            "mcp-chat",
            "call",
            "echo",
            "--arguments",
            r#"{"message":"hi"}"#,
            "--server-command",
            "node",
            "--server-arg",
            "server.js",
            "--server-arg",
            "--stdio",
        ]);

        assert_eq!(cli.server_command.as_deref(), Some("node"));
        assert_eq!(cli.server_args, vec!["server.js", "--stdio"]);
        match cli.command {
            Some(Commands::Call { tool, arguments }) => {
                assert_eq!(tool, "echo");
                assert_eq!(arguments, r#"{"message":"hi"}"#);
            }
            _ => panic!("expected call subcommand"),
        }
    }

    #[test]
    fn test_no_subcommand_means_chat() {
        let cli = Cli::parse_from(["mcp-chat", "--model", "gpt-4o"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
    }
}
