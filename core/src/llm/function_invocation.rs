//! Automatic tool invocation on top of any [`LlmClient`]
//!
//! The wrapped client is offered every tool registered in the executor. When
//! the model answers with tool calls, the calls are executed, their results
//! are sent back, and the model is asked again until it produces a plain
//! answer. Only that final answer is returned to the caller; the intermediate
//! tool exchange lives in a per-request copy of the messages.

use crate::error::{Error, LlmError, Result};
use crate::llm::{
    ContentBlock, LlmClient, LlmMessage, LlmResponse, ResponseAssembler, ToolDefinition,
};
use crate::tools::{ToolCall, ToolExecutor};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on model round trips for a single request
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Chat client that runs tool calls requested by the model
pub struct FunctionInvokingClient {
    inner: Arc<dyn LlmClient>,
    tools: ToolExecutor,
    max_iterations: usize,
}

impl FunctionInvokingClient {
    pub fn new(inner: Arc<dyn LlmClient>, tools: ToolExecutor) -> Self {
        Self {
            inner,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn tools(&self) -> &ToolExecutor {
        &self.tools
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn tool_definitions(&self) -> Option<Vec<ToolDefinition>> {
        let definitions = self.tools.get_tool_definitions();
        if definitions.is_empty() {
            None
        } else {
            Some(definitions)
        }
    }

    /// Get one complete answer
    pub async fn get_response(&self, messages: &[LlmMessage]) -> Result<LlmResponse> {
        let never = CancellationToken::new();
        let mut working = messages.to_vec();
        let definitions = self.tool_definitions();

        for iteration in 1..=self.max_iterations {
            debug!("Requesting completion (iteration {})", iteration);
            let response = self
                .inner
                .chat_completion(working.clone(), definitions.clone(), None)
                .await?;

            if !response.message.has_tool_use() {
                return Ok(response);
            }
            self.invoke_tools(&mut working, response.message, &never)
                .await?;
        }

        Err(LlmError::TooManyIterations {
            max_iterations: self.max_iterations,
        }
        .into())
    }

    /// Get one answer as a stream of text fragments.
    ///
    /// Each fragment is handed to `on_text` as soon as it arrives. Returns the
    /// assembled final response, or [`Error::Cancelled`] once `cancel` fires.
    pub async fn get_streaming_response<F>(
        &self,
        messages: &[LlmMessage],
        cancel: &CancellationToken,
        mut on_text: F,
    ) -> Result<LlmResponse>
    where
        F: FnMut(&str),
    {
        if !self.inner.supports_streaming() {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                response = self.get_response(messages) => response?,
            };
            if let Some(text) = response.message.get_text() {
                on_text(&text);
            }
            return Ok(response);
        }

        let mut working = messages.to_vec();
        let definitions = self.tool_definitions();

        for iteration in 1..=self.max_iterations {
            debug!("Requesting streamed completion (iteration {})", iteration);
            let mut stream = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                stream = self.inner.chat_completion_stream(working.clone(), definitions.clone(), None) => stream?,
            };

            let mut assembler = ResponseAssembler::new();
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    next = stream.next() => next,
                };
                let Some(chunk) = next else { break };
                if let Some(delta) = assembler.push(chunk?) {
                    on_text(&delta);
                }
            }
            drop(stream);

            let response = assembler.finish(self.inner.model_name());
            if !response.message.has_tool_use() {
                return Ok(response);
            }
            self.invoke_tools(&mut working, response.message, cancel)
                .await?;
        }

        Err(LlmError::TooManyIterations {
            max_iterations: self.max_iterations,
        }
        .into())
    }

    /// Run every tool use in `assistant` and append the exchange to `working`.
    ///
    /// Returns [`Error::Cancelled`] as soon as `cancel` fires, even while a
    /// tool is still running.
    async fn invoke_tools(
        &self,
        working: &mut Vec<LlmMessage>,
        assistant: LlmMessage,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let calls: Vec<ToolCall> = assistant
            .get_tool_uses()
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    parameters: input.clone(),
                }),
                _ => None,
            })
            .collect();
        working.push(assistant);

        for call in calls {
            info!("Invoking tool '{}' (id: {})", call.name, call.id);
            let call_id = call.id.clone();
            let executed = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                executed = self.tools.execute(call) => executed,
            };
            let (content, is_error) = match executed {
                Ok(result) => {
                    debug!(
                        "Tool call {} finished in {} ms",
                        call_id,
                        result.duration_ms.unwrap_or_default()
                    );
                    (result.content, !result.success)
                }
                Err(e) => {
                    warn!("Tool call {} failed: {}", call_id, e);
                    (format!("Error: {}", e), true)
                }
            };
            working.push(LlmMessage::tool_result(call_id, content, is_error));
        }
        Ok(())
    }
}
