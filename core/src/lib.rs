//! # mcp-chat Core
//!
//! Core library for mcp-chat: connect to an MCP server over stdio, expose its
//! tools to an OpenAI chat model, and let the model call them while it
//! answers.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod tools;

// Re-export commonly used types
pub use config::{ClientIdentity, McpServerConfig, ModelParams, ResolvedLlmConfig};
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use llm::{FunctionInvokingClient, LlmClient, OpenAiClient};
pub use mcp::{McpCallResult, McpClient, McpToolInfo, ToolProvider};
pub use tools::ToolExecutor;

/// Current version of the mcp-chat-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing on stderr so logs never interleave with streamed answers
///
/// Debug mode always logs at `debug`. Otherwise `RUST_LOG` is honoured and
/// the default is `warn`.
pub fn init_tracing_with_debug(debug: bool) {
    let directive = log_directive(debug, std::env::var("RUST_LOG").ok());
    let filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn log_directive(debug: bool, rust_log: Option<String>) -> String {
    if debug {
        return "debug".to_string();
    }
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "warn".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_overrides_rust_log() {
        assert_eq!(log_directive(true, Some("info".to_string())), "debug");
        assert_eq!(log_directive(true, None), "debug");
    }

    #[test]
    fn test_rust_log_used_without_debug() {
        assert_eq!(log_directive(false, Some("rmcp=trace".to_string())), "rmcp=trace");
        assert_eq!(log_directive(false, Some("  ".to_string())), "warn");
        assert_eq!(log_directive(false, None), "warn");
    }
}
