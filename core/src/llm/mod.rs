//! LLM client abstractions and implementations

pub mod client;
pub mod function_invocation;
pub mod message;
pub mod providers;
pub mod stream;

pub use client::{
    ChatOptions, FinishReason, FunctionDefinition, LlmClient, LlmResponse, LlmStream,
    LlmStreamChunk, ToolCallDelta, ToolDefinition, Usage,
};
pub use function_invocation::{FunctionInvokingClient, DEFAULT_MAX_ITERATIONS};
pub use message::{ContentBlock, LlmMessage, MessageContent, MessageRole};
pub use providers::*;
pub use stream::{ResponseAssembler, ToolCallAccumulator};
