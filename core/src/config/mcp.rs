//! MCP server launch configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to launch a stdio MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Stable identifier used in logs
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Executable to run
    pub command: String,
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the server process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpServerConfig {
    pub fn new<S: Into<String>>(id: S, name: S, command: S) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env.insert(key, value);
        self
    }

    /// The full command line, for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for McpServerConfig {
    /// The MCP "everything" reference server, fetched and run through npx
    fn default() -> Self {
        Self::new("everything", "Everything", "npx")
            .with_args(["-y", "@modelcontextprotocol/server-everything"])
    }
}

/// Name and version this client announces during the MCP handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: "TestClient".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}
