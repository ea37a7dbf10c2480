//! CLI configuration loader for mcp-chat
//!
//! Each setting is taken from the first source that provides it:
//! 1. Command-line flags
//! 2. Config file (`--config`, or `./mcp-chat.json` when present)
//! 3. Environment variables (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`)
//! 4. Built-in defaults (the "everything" server, `gpt-4o-mini`, placeholder key)

use anyhow::{anyhow, Context, Result};
use mcp_chat_core::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, PLACEHOLDER_API_KEY};
use mcp_chat_core::{ClientIdentity, McpServerConfig, ModelParams, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mcp-chat.json";

const ENV_KEYS: [&str; 3] = ["OPENAI_API_KEY", "OPENAI_BASE_URL", "OPENAI_MODEL"];

/// Raw configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub params: ModelParams,
    /// MCP server to launch
    pub server: Option<McpServerConfig>,
    /// Identity announced to the MCP server
    pub client: Option<ClientIdentity>,
}

/// Everything the commands need
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub llm: ResolvedLlmConfig,
    pub server: McpServerConfig,
    pub identity: ClientIdentity,
}

/// CLI configuration loader
pub struct CliConfigLoader {
    config_override: Option<PathBuf>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    server_command_override: Option<String>,
    server_args_override: Option<Vec<String>>,
    env: HashMap<String, String>,
}

impl CliConfigLoader {
    /// Create a loader that reads the process environment
    pub fn new() -> Self {
        let env = ENV_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::with_env(env)
    }

    /// Create a loader with an explicit environment snapshot
    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self {
            config_override: None,
            api_key_override: None,
            base_url_override: None,
            model_override: None,
            server_command_override: None,
            server_args_override: None,
            env,
        }
    }

    /// Set config file override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Replace the MCP server executable
    pub fn with_server_command_override(mut self, command: String) -> Self {
        self.server_command_override = Some(command);
        self
    }

    /// Replace the MCP server arguments
    pub fn with_server_args_override(mut self, args: Vec<String>) -> Self {
        self.server_args_override = Some(args);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<LoadedConfig> {
        let file = match &self.config_override {
            Some(path) => Some(self.load_file(path).await.with_context(|| {
                format!("Failed to load config from override path: {}", path.display())
            })?),
            None => self.try_load_cwd().await?,
        }
        .unwrap_or_default();

        let api_key = match self.api_key_override.clone().or(file.api_key) {
            Some(key) => resolve_env_reference(&key)?,
            None => match self.env.get("OPENAI_API_KEY") {
                Some(key) => key.clone(),
                None => {
                    warn!(
                        "No API key configured; using the placeholder '{}'. Set OPENAI_API_KEY to talk to the model.",
                        PLACEHOLDER_API_KEY
                    );
                    PLACEHOLDER_API_KEY.to_string()
                }
            },
        };

        let base_url = self
            .base_url_override
            .clone()
            .or(file.base_url)
            .or_else(|| self.env.get("OPENAI_BASE_URL").cloned())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = self
            .model_override
            .clone()
            .or(file.model)
            .or_else(|| self.env.get("OPENAI_MODEL").cloned())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let llm = ResolvedLlmConfig::new(base_url, api_key, model).with_params(file.params);
        llm.validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        let mut server = file.server.unwrap_or_default();
        if let Some(command) = &self.server_command_override {
            server.command = command.clone();
        }
        if let Some(args) = &self.server_args_override {
            server.args = args.clone();
        }
        if server.command.is_empty() {
            return Err(anyhow!("MCP server command cannot be empty"));
        }

        Ok(LoadedConfig {
            llm,
            server,
            identity: file.client.unwrap_or_default(),
        })
    }

    /// Try loading from current working directory
    async fn try_load_cwd(&self) -> Result<Option<RawConfig>> {
        let path = std::env::current_dir()?.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            return Ok(Some(self.load_file(&path).await?));
        }
        Ok(None)
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        debug!("Loading config file {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `env:VAR_NAME` to the value of that variable
fn resolve_env_reference(value: &str) -> Result<String> {
    match value.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .with_context(|| format!("Environment variable not found: {}", var_name)),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, content).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_env_fills_llm_settings() {
        let (_dir, path) = write_config("{}").await;
        let loaded = CliConfigLoader::with_env(env(&[
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_MODEL", "gpt-4o"),
        ]))
        .with_config_override(path)
        .load()
        .await
        .unwrap();

        assert_eq!(loaded.llm.api_key, "sk-env");
        assert_eq!(loaded.llm.model, "gpt-4o");
        assert_eq!(loaded.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(loaded.server, McpServerConfig::default());
        assert_eq!(loaded.identity, ClientIdentity::default());
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_to_placeholder() {
        let (_dir, path) = write_config("{}").await;
        let loaded = CliConfigLoader::with_env(HashMap::new())
            .with_config_override(path)
            .load()
            .await
            .unwrap();

        assert!(loaded.llm.uses_placeholder_key());
        assert_eq!(loaded.llm.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_file_beats_env_and_flags_beat_file() {
        let (_dir, path) = write_config(
            r#"{
                "api_key": "sk-file",
                "model": "gpt-4.1-mini",
                "base_url": "http://localhost:8080/v1",
                "params": {"temperature": 0.2},
                "server": {
                    "id": "fs",
                    "name": "Filesystem",
                    "command": "mcp-server-filesystem",
                    "args": ["/tmp"]
                },
                "client": {"name": "DemoClient", "version": "2.0.0"}
            }"#,
        )
        .await;

        let loaded = CliConfigLoader::with_env(env(&[("OPENAI_API_KEY", "sk-env")]))
            .with_config_override(path)
            .with_model_override("gpt-4o".to_string())
            .with_server_args_override(vec!["/srv".to_string()])
            .load()
            .await
            .unwrap();

        assert_eq!(loaded.llm.api_key, "sk-file");
        assert_eq!(loaded.llm.model, "gpt-4o");
        assert_eq!(loaded.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(loaded.llm.params.temperature, Some(0.2));
        assert_eq!(loaded.server.id, "fs");
        assert_eq!(loaded.server.command, "mcp-server-filesystem");
        assert_eq!(loaded.server.args, vec!["/srv".to_string()]);
        assert_eq!(loaded.identity.name, "DemoClient");
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_rejected() {
        let (_dir, path) = write_config("{}").await;
        let err = CliConfigLoader::with_env(HashMap::new())
            .with_config_override(path)
            .with_base_url_override("localhost:8080".to_string())
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_missing_override_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = CliConfigLoader::with_env(HashMap::new())
            .with_config_override(dir.path().join("nope.json"))
            .load()
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_plain_api_key_is_kept() {
        assert_eq!(resolve_env_reference("sk-literal").unwrap(), "sk-literal");
        assert!(resolve_env_reference("env:MCP_CHAT_TEST_UNSET_VARIABLE").is_err());
    }
}
