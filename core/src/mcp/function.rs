//! MCP tools exposed to the model as callable functions

use super::types::{McpToolInfo, ToolProvider};
use crate::error::Result;
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use std::sync::Arc;

/// One MCP tool behind the [`Tool`] trait
pub struct McpFunction {
    provider: Arc<dyn ToolProvider>,
    info: McpToolInfo,
    description: String,
}

impl McpFunction {
    pub fn new(provider: Arc<dyn ToolProvider>, info: McpToolInfo) -> Self {
        let description = info.description.clone().unwrap_or_default();
        Self {
            provider,
            info,
            description,
        }
    }
}

#[async_trait]
impl Tool for McpFunction {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.info.input_schema.clone()
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let result = self
            .provider
            .call_tool(&self.info.name, call.parameters)
            .await?;

        let rendered = result.render();
        Ok(if result.is_error {
            ToolResult::error(call.id, rendered)
        } else {
            ToolResult::success(call.id, rendered)
        })
    }
}
