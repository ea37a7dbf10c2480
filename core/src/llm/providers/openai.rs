//! OpenAI client implementation using async-openai library

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, LlmStream,
    LlmStreamChunk, MessageContent, MessageRole, ToolCallDelta, ToolDefinition, Usage,
};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

/// OpenAI client using async-openai library
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    options: ChatOptions,
}

impl OpenAiClient {
    /// Create a new OpenAI client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for OpenAI".to_string(),
            }
            .into());
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        tracing::debug!(
            "OpenAI client for model '{}' at {}",
            config.model,
            config.base_url
        );

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            options: ChatOptions::from(&config.params),
        })
    }

    /// Convert our internal message format to async-openai format
    fn convert_messages(
        &self,
        messages: Vec<LlmMessage>,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut converted = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role {
                MessageRole::System => {
                    let content = extract_text_content(&message.content);
                    converted.push(ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage {
                            content: content.into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::User => {
                    let content = extract_text_content(&message.content);
                    converted.push(ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage {
                            content: content.into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::Assistant => {
                    converted.push(ChatCompletionRequestMessage::Assistant(
                        convert_assistant_message(&message.content),
                    ));
                }
                MessageRole::Tool => {
                    let mut pushed_any = false;
                    if let MessageContent::MultiModal(blocks) = &message.content {
                        for block in blocks {
                            if let ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                                ..
                            } = block
                            {
                                converted.push(ChatCompletionRequestMessage::Tool(
                                    ChatCompletionRequestToolMessage {
                                        content: ChatCompletionRequestToolMessageContent::Text(
                                            content.clone(),
                                        ),
                                        tool_call_id: tool_use_id.clone(),
                                    },
                                ));
                                pushed_any = true;
                            }
                        }
                    }
                    if !pushed_any {
                        return Err((LlmError::InvalidRequest {
                            message: "Tool message must contain ToolResult".to_string(),
                        })
                        .into());
                    }
                }
            }
        }

        Ok(converted)
    }

    /// Convert our tool definitions to async-openai format
    fn convert_tools(&self, tools: Vec<ToolDefinition>) -> Vec<ChatCompletionTool> {
        tools
            .into_iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.function.name,
                    description: Some(tool.function.description),
                    parameters: Some(tool.function.parameters),
                    strict: None,
                },
            })
            .collect()
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
        stream: bool,
    ) -> Result<CreateChatCompletionRequest> {
        let converted_messages = self.convert_messages(messages)?;
        let converted_tools = tools
            .filter(|t| !t.is_empty())
            .map(|t| self.convert_tools(t));

        if let Some(ref tools) = converted_tools {
            tracing::debug!("OpenAI request with {} tools enabled", tools.len());
        }

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(converted_messages);
        if stream {
            request_builder.stream(true);
        }

        if let Some(tools) = converted_tools {
            request_builder.tools(tools);
        }

        let opts = options.unwrap_or_else(|| self.options.clone());
        if let Some(max_tokens) = opts.max_tokens {
            request_builder.max_completion_tokens(max_tokens);
        }
        if let Some(temperature) = opts.temperature {
            request_builder.temperature(temperature);
        }
        if let Some(top_p) = opts.top_p {
            request_builder.top_p(top_p);
        }

        request_builder.build().map_err(|e| {
            tracing::error!("Failed to build OpenAI request: {}", e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
            .into()
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options, false)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("OpenAI API call failed: {}", e);
            LlmError::ApiError {
                message: e.to_string(),
            }
        })?;

        let response = convert_response(response)?;
        for block in response.message.get_tool_uses() {
            if let ContentBlock::ToolUse { id, name, .. } = block {
                tracing::debug!("Tool call: {} (id: {})", name, id);
            }
        }

        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmStream<'_>> {
        let request = self.build_request(messages, tools, options, true)?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| LlmError::ApiError {
                message: e.to_string(),
            })?;

        let converted_stream = stream.map(|result| match result {
            Ok(chunk) => Ok(convert_stream_chunk(chunk)),
            Err(e) => Err((LlmError::ApiError {
                message: e.to_string(),
            })
            .into()),
        });

        Ok(Box::new(Box::pin(converted_stream)))
    }
}

/// Extract text content from MessageContent
fn extract_text_content(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::MultiModal(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn convert_assistant_message(content: &MessageContent) -> ChatCompletionRequestAssistantMessage {
    let (text, tool_calls) = match content {
        MessageContent::Text(text) => (text.clone(), Vec::new()),
        MessageContent::MultiModal(blocks) => {
            let mut text = String::new();
            let mut tool_calls = Vec::new();

            for block in blocks {
                match block {
                    ContentBlock::Text { text: part } => {
                        if !text.is_empty() {
                            text.push('\n');
                        }
                        text.push_str(part);
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        tool_calls.push(ChatCompletionMessageToolCall {
                            id: id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: name.clone(),
                                arguments: input.to_string(),
                            },
                        });
                    }
                    ContentBlock::ToolResult { .. } => {}
                }
            }
            (text, tool_calls)
        }
    };

    ChatCompletionRequestAssistantMessage {
        content: if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(ChatCompletionRequestAssistantMessageContent::Text(text))
        },
        name: None,
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        audio: None,
        refusal: None,
        ..Default::default()
    }
}

fn convert_finish_reason(reason: async_openai::types::FinishReason) -> FinishReason {
    match reason {
        async_openai::types::FinishReason::Stop => FinishReason::Stop,
        async_openai::types::FinishReason::Length => FinishReason::Length,
        async_openai::types::FinishReason::ToolCalls => FinishReason::ToolCalls,
        async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
        async_openai::types::FinishReason::FunctionCall => FinishReason::ToolCalls,
    }
}

fn convert_usage(usage: async_openai::types::CompletionUsage) -> Usage {
    Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    }
}

/// Convert async-openai response to our internal format
fn convert_response(
    response: async_openai::types::CreateChatCompletionResponse,
) -> Result<LlmResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidRequest {
            message: "No choices in response".to_string(),
        })?;

    let mut blocks = Vec::new();
    if let Some(content) = choice.message.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }
    for tool_call in choice.message.tool_calls.unwrap_or_default() {
        let function = tool_call.function;
        let input: Value = serde_json::from_str(&function.arguments)
            .unwrap_or_else(|_| Value::String(function.arguments.clone()));

        blocks.push(ContentBlock::ToolUse {
            id: tool_call.id,
            name: function.name,
            input,
        });
    }

    let content = match blocks.as_slice() {
        [] => MessageContent::Text(String::new()),
        [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
        _ => MessageContent::MultiModal(blocks),
    };

    Ok(LlmResponse {
        message: LlmMessage {
            role: MessageRole::Assistant,
            content,
        },
        usage: response.usage.map(convert_usage),
        model: response.model,
        finish_reason: choice.finish_reason.map(convert_finish_reason),
    })
}

/// Convert async-openai stream chunk to our internal format
fn convert_stream_chunk(
    chunk: async_openai::types::CreateChatCompletionStreamResponse,
) -> LlmStreamChunk {
    let usage = chunk.usage.map(convert_usage);
    let Some(choice) = chunk.choices.into_iter().next() else {
        return LlmStreamChunk {
            usage,
            ..Default::default()
        };
    };

    let tool_calls = choice
        .delta
        .tool_calls
        .map(|tool_calls| {
            tool_calls
                .into_iter()
                .map(|tool_call| {
                    let (name, arguments) = match tool_call.function {
                        Some(function) => (function.name, function.arguments),
                        None => (None, None),
                    };
                    ToolCallDelta {
                        index: tool_call.index,
                        id: tool_call.id,
                        name,
                        arguments,
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|calls| !calls.is_empty());

    LlmStreamChunk {
        delta: choice.delta.content,
        tool_calls,
        finish_reason: choice.finish_reason.map(convert_finish_reason),
        usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionDefinition;
    use serde_json::json;

    fn client() -> OpenAiClient {
        OpenAiClient::new(&ResolvedLlmConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let mut config = ResolvedLlmConfig::default();
        config.api_key.clear();
        assert!(OpenAiClient::new(&config).is_err());
    }

    #[test]
    fn test_convert_messages_keeps_tool_exchange() {
        let messages = vec![
            LlmMessage::system("be brief"),
            LlmMessage::user("echo hi"),
            LlmMessage {
                role: MessageRole::Assistant,
                content: MessageContent::MultiModal(vec![ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "echo".to_string(),
                    input: json!({"message": "hi"}),
                }]),
            },
            LlmMessage::tool_result("call_1", "Echo: hi", false),
            LlmMessage::assistant("Echo: hi"),
        ];

        let converted = client().convert_messages(messages).unwrap();
        assert_eq!(converted.len(), 5);

        match &converted[2] {
            ChatCompletionRequestMessage::Assistant(assistant) => {
                assert!(assistant.content.is_none());
                let calls = assistant.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.name, "echo");
                assert_eq!(calls[0].function.arguments, r#"{"message":"hi"}"#);
            }
            other => panic!("expected assistant message, got {:?}", other),
        }

        match &converted[3] {
            ChatCompletionRequestMessage::Tool(tool) => {
                assert_eq!(tool.tool_call_id, "call_1");
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_message_without_result_is_rejected() {
        let message = LlmMessage {
            role: MessageRole::Tool,
            content: MessageContent::Text("orphan".to_string()),
        };
        assert!(client().convert_messages(vec![message]).is_err());
    }

    #[test]
    fn test_build_request_includes_tools_and_stream_flag() {
        let tools = vec![ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "echo".to_string(),
                description: "Echoes back the input".to_string(),
                parameters: json!({"type": "object"}),
            },
        }];

        let request = client()
            .build_request(vec![LlmMessage::user("hi")], Some(tools), None, true)
            .unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.stream, Some(true));
        let tools = request.tools.unwrap();
        assert_eq!(tools[0].function.name, "echo");
    }

    #[test]
    fn test_build_request_omits_empty_tool_list() {
        let request = client()
            .build_request(vec![LlmMessage::user("hi")], Some(Vec::new()), None, false)
            .unwrap();
        assert!(request.tools.is_none());
    }
}
