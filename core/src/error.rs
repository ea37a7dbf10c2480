//! Error types and handling for mcp-chat core

use thiserror::Error;

/// Result type alias for mcp-chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mcp-chat core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// MCP client errors
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation was cancelled before it finished
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Command not found on PATH: {command}")]
    CommandNotFound { command: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Model kept requesting tools after {max_iterations} iterations")]
    TooManyIterations { max_iterations: usize },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to start MCP server '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("MCP handshake failed: {message}")]
    Initialize { message: String },

    #[error("MCP request '{method}' failed: {message}")]
    Request { method: String, message: String },

    #[error("Tool '{tool}' returned no text content")]
    NoTextContent { tool: String },
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
