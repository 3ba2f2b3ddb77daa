//! LLM client module.
//!
//! [`LlmClient`] is the completion invoker seam: the agent loop only ever
//! talks to the model through it. [`OpenAiClient`] speaks the
//! OpenAI-compatible chat-completions API; [`RetryingClient`] wraps any
//! client with bounded exponential backoff for callers that want retries.

mod error;
mod openai;
mod retry;
mod types;

use async_trait::async_trait;

pub use error::LlmError;
pub use openai::OpenAiClient;
pub use retry::{RetryPolicy, RetryingClient};
pub use types::{
    ChatMessage, ChatResponse, FinishReason, FunctionCall, FunctionSchema, Role, ToolCall,
    ToolSchema, Usage,
};

/// A chat-completion provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Submit `messages` (and the declared tools, if any) and return one completion choice.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError>;
}
