//! Tool system shared by MCP functions and the function-invocation loop

pub mod base;

pub use base::{Tool, ToolCall, ToolExecutor, ToolResult};
