//! Reassembly of streamed completions

use super::client::{FinishReason, LlmResponse, LlmStreamChunk, ToolCallDelta, Usage};
use super::message::{ContentBlock, LlmMessage, MessageContent, MessageRole};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Merges tool call fragments by their index
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: ToolCallDelta) {
        let entry = self.calls.entry(delta.index).or_default();
        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            entry.id = id;
        }
        if let Some(name) = delta.name.filter(|name| !name.is_empty()) {
            entry.name = name;
        }
        if let Some(arguments) = delta.arguments {
            entry.arguments.push_str(&arguments);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Complete tool use blocks, in index order.
    ///
    /// Calls without a name are dropped. Empty arguments mean `{}`; arguments
    /// that are not valid JSON are passed through as a string.
    pub fn finish(self) -> Vec<ContentBlock> {
        self.calls
            .into_values()
            .filter(|call| {
                if call.name.is_empty() {
                    tracing::warn!("Dropping streamed tool call without a name (id '{}')", call.id);
                    false
                } else {
                    true
                }
            })
            .map(|call| {
                let input = if call.arguments.trim().is_empty() {
                    Value::Object(Default::default())
                } else {
                    serde_json::from_str(&call.arguments).unwrap_or_else(|e| {
                        tracing::warn!("Failed to parse arguments for '{}': {}", call.name, e);
                        Value::String(call.arguments.clone())
                    })
                };
                ContentBlock::ToolUse {
                    id: call.id,
                    name: call.name,
                    input,
                }
            })
            .collect()
    }
}

/// Folds stream chunks into one assistant response
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    text: String,
    tool_calls: ToolCallAccumulator,
    usage: Option<Usage>,
    finish_reason: Option<FinishReason>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one chunk, returning its text delta if it carried one
    pub fn push(&mut self, chunk: LlmStreamChunk) -> Option<String> {
        if let Some(tool_calls) = chunk.tool_calls {
            for delta in tool_calls {
                self.tool_calls.push(delta);
            }
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
        if chunk.finish_reason.is_some() {
            self.finish_reason = chunk.finish_reason;
        }

        let delta = chunk.delta.filter(|d| !d.is_empty())?;
        self.text.push_str(&delta);
        Some(delta)
    }

    pub fn finish(self, model: &str) -> LlmResponse {
        let tool_uses = self.tool_calls.finish();
        let content = if tool_uses.is_empty() {
            MessageContent::Text(self.text)
        } else {
            let mut blocks = Vec::with_capacity(tool_uses.len() + 1);
            if !self.text.is_empty() {
                blocks.push(ContentBlock::Text { text: self.text });
            }
            blocks.extend(tool_uses);
            MessageContent::MultiModal(blocks)
        };

        LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
            },
            usage: self.usage,
            model: model.to_string(),
            finish_reason: self.finish_reason,
        }
    }
}
