//! MCP data as seen by the rest of the crate

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool exposed by an MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema of the tool arguments
    pub input_schema: Value,
}

/// One content item of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpContent {
    Text { text: String },
    Image { mime_type: String, data: String },
    Resource { uri: String, text: Option<String> },
    Other { kind: String, summary: String },
}

impl McpContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            McpContent::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Short human readable form, used when a result carries no text
    pub fn summary(&self) -> String {
        match self {
            McpContent::Text { text } => text.clone(),
            McpContent::Image { mime_type, data } => {
                format!("[image {} ({} bytes base64)]", mime_type, data.len())
            }
            McpContent::Resource { uri, text } => match text {
                Some(text) => format!("[resource {}]\n{}", uri, text),
                None => format!("[resource {}]", uri),
            },
            McpContent::Other { kind, summary } => format!("[{}] {}", kind, summary),
        }
    }
}

/// Result of `tools/call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpCallResult {
    pub content: Vec<McpContent>,
    #[serde(default)]
    pub is_error: bool,
    pub structured_content: Option<Value>,
}

impl McpCallResult {
    /// The first text item
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(McpContent::as_text)
    }

    /// All text items, newline separated
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(McpContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Everything in the result rendered for a language model
    pub fn render(&self) -> String {
        if self.content.is_empty() {
            return self
                .structured_content
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default();
        }
        self.content
            .iter()
            .map(McpContent::summary)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Something that can run named tools
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpCallResult>;
}
