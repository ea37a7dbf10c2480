//! Stdio MCP client built on the official `rmcp` SDK

use super::function::McpFunction;
use super::types::{McpCallResult, McpContent, McpToolInfo, ToolProvider};
use crate::config::{ClientIdentity, McpServerConfig};
use crate::error::{ConfigError, McpError, Result, ToolError};
use crate::tools::ToolExecutor;
use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ClientCapabilities, ClientInfo, Content,
    Implementation, LoggingLevel, LoggingMessageNotificationParam, ProtocolVersion, RawContent,
    ResourceContents,
};
use rmcp::service::{NotificationContext, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{ClientHandler, RoleClient};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
struct ChatClientHandler {
    info: ClientInfo,
}

impl ClientHandler for ChatClientHandler {
    fn get_info(&self) -> ClientInfo {
        self.info.clone()
    }

    async fn on_logging_message(
        &self,
        params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        let LoggingMessageNotificationParam {
            level,
            logger,
            data,
        } = params;
        let logger = logger.as_deref();
        match level {
            LoggingLevel::Critical
            | LoggingLevel::Alert
            | LoggingLevel::Emergency
            | LoggingLevel::Error => {
                error!("MCP server log: logger={:?} data={}", logger, data);
            }
            LoggingLevel::Warning => {
                warn!("MCP server log: logger={:?} data={}", logger, data);
            }
            LoggingLevel::Debug => {
                debug!("MCP server log: logger={:?} data={}", logger, data);
            }
            _ => {
                info!("MCP server log: logger={:?} data={}", logger, data);
            }
        }
    }
}

fn build_client_info(identity: &ClientIdentity) -> ClientInfo {
    ClientInfo {
        protocol_version: ProtocolVersion::LATEST,
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: identity.name.clone(),
            title: None,
            version: identity.version.clone(),
            icons: None,
            website_url: None,
        },
    }
}

/// Connection to one MCP server running as a child process
pub struct McpClient {
    server: McpServerConfig,
    service: RunningService<RoleClient, ChatClientHandler>,
}

impl McpClient {
    /// Spawn the server and complete the MCP handshake
    pub async fn connect(server: &McpServerConfig, identity: &ClientIdentity) -> Result<Self> {
        let program = which::which(&server.command).map_err(|_| ConfigError::CommandNotFound {
            command: server.command.clone(),
        })?;
        debug!("Resolved '{}' to {}", server.command, program.display());

        let command = tokio::process::Command::new(program).configure(|cmd| {
            cmd.args(&server.args);
            cmd.envs(&server.env);
        });
        let transport = TokioChildProcess::new(command).map_err(|e| McpError::Spawn {
            command: server.command_line(),
            message: e.to_string(),
        })?;

        info!(
            "Starting MCP server '{}' ({}): {}",
            server.name,
            server.id,
            server.command_line()
        );
        let handler = ChatClientHandler {
            info: build_client_info(identity),
        };
        let service = rmcp::serve_client(handler, transport)
            .await
            .map_err(|e| McpError::Initialize {
                message: e.to_string(),
            })?;

        if let Some(peer) = service.peer().peer_info() {
            info!(
                "Connected to MCP server {} {}",
                peer.server_info.name, peer.server_info.version
            );
        }

        Ok(Self {
            server: server.clone(),
            service,
        })
    }

    /// Name and version the server reported during the handshake
    pub fn server_info(&self) -> Option<(String, String)> {
        self.service.peer().peer_info().map(|info| {
            (
                info.server_info.name.clone(),
                info.server_info.version.clone(),
            )
        })
    }

    /// List every tool the server exposes, following pagination
    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>> {
        let tools = self
            .service
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| McpError::Request {
                method: "tools/list".to_string(),
                message: e.to_string(),
            })?;
        debug!("Server '{}' exposes {} tools", self.server.id, tools.len());
        Ok(tools.into_iter().map(map_tool).collect())
    }

    /// Wrap every server tool as a [`McpFunction`]
    pub async fn functions(self: &Arc<Self>) -> Result<Vec<McpFunction>> {
        let provider: Arc<dyn ToolProvider> = self.clone();
        Ok(self
            .list_tools()
            .await?
            .into_iter()
            .map(|info| McpFunction::new(provider.clone(), info))
            .collect())
    }

    /// Register every server tool with `executor`, returning how many were added
    pub async fn register_functions(self: &Arc<Self>, executor: &mut ToolExecutor) -> Result<usize> {
        let functions = self.functions().await?;
        let count = functions.len();
        for function in functions {
            executor.register_tool(Box::new(function));
        }
        Ok(count)
    }

    /// Stop the service and the server process
    pub async fn shutdown(self) {
        match self.service.cancel().await {
            Ok(reason) => debug!("MCP service for '{}' stopped: {:?}", self.server.id, reason),
            Err(e) => warn!("MCP service for '{}' did not stop cleanly: {}", self.server.id, e),
        }
    }
}

#[async_trait]
impl ToolProvider for McpClient {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpCallResult> {
        let arguments = match arguments {
            Value::Null => None,
            Value::Object(map) => Some(map),
            other => {
                return Err(ToolError::InvalidParameters {
                    message: format!("MCP tool arguments must be an object, got: {}", other),
                }
                .into());
            }
        };

        debug!("Calling MCP tool '{}' on '{}'", name, self.server.id);
        let result = self
            .service
            .peer()
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments,
            })
            .await
            .map_err(|e| McpError::Request {
                method: "tools/call".to_string(),
                message: e.to_string(),
            })?;

        Ok(map_call_result(result))
    }
}

fn map_tool(tool: rmcp::model::Tool) -> McpToolInfo {
    McpToolInfo {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: Value::Object((*tool.input_schema).clone()),
    }
}

fn map_call_result(result: CallToolResult) -> McpCallResult {
    McpCallResult {
        content: result.content.into_iter().map(map_content).collect(),
        is_error: result.is_error.unwrap_or(false),
        structured_content: result.structured_content,
    }
}

fn map_content(content: Content) -> McpContent {
    match content.raw {
        RawContent::Text(text) => McpContent::Text { text: text.text },
        RawContent::Image(image) => McpContent::Image {
            mime_type: image.mime_type,
            data: image.data,
        },
        RawContent::Resource(resource) => match resource.resource {
            ResourceContents::TextResourceContents { uri, text, .. } => McpContent::Resource {
                uri,
                text: Some(text),
            },
            ResourceContents::BlobResourceContents { uri, .. } => {
                McpContent::Resource { uri, text: None }
            }
        },
        RawContent::Audio(audio) => McpContent::Other {
            kind: "audio".to_string(),
            summary: audio.mime_type,
        },
        RawContent::ResourceLink(link) => McpContent::Other {
            kind: "resource_link".to_string(),
            summary: link.uri,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_tool_keeps_schema() {
        let schema = json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"]
        });
        let Value::Object(schema_map) = schema.clone() else {
            unreachable!()
        };
        let tool = rmcp::model::Tool::new("echo", "Echoes back the input", Arc::new(schema_map));

        let info = map_tool(tool);
        assert_eq!(info.name, "echo");
        assert_eq!(info.description.as_deref(), Some("Echoes back the input"));
        assert_eq!(info.input_schema, schema);
    }

    #[test]
    fn test_map_call_result_text() {
        let result = map_call_result(CallToolResult::success(vec![Content::text(
            "Echo: Hello MCP!",
        )]));
        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.first_text(), Some("Echo: Hello MCP!"));
    }

    #[test]
    fn test_map_call_result_error_flag() {
        let result = map_call_result(CallToolResult::error(vec![Content::text("boom")]));
        assert!(result.is_error);
        assert_eq!(result.text_content(), "boom");
    }

    #[test]
    fn test_client_info_announces_identity() {
        let info = build_client_info(&ClientIdentity::default());
        assert_eq!(info.client_info.name, "TestClient");
        assert_eq!(info.client_info.version, "1.0.0");
    }

    #[tokio::test]
    async fn test_connect_fails_for_missing_command() {
        let server = McpServerConfig::new("ghost", "Ghost", "mcp-chat-no-such-server-binary");
        let err = McpClient::connect(&server, &ClientIdentity::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::CommandNotFound { .. })
        ));
    }
}
