//! Minimal configuration module for mcp-chat core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod mcp;
pub mod types;

pub use mcp::{ClientIdentity, McpServerConfig};
pub use types::{
    ModelParams, ResolvedLlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, PLACEHOLDER_API_KEY,
};
