//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, Role};

/// Request to answer a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The new user message
    pub message: String,

    /// Prior turns of the conversation, oldest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// One prior turn as kept by a chat front-end.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    /// Front-ends send `null` for turns that carried no text.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatRequest {
    /// History as transcript messages. Only user and assistant turns are kept.
    pub fn history_messages(&self) -> Vec<ChatMessage> {
        self.history
            .iter()
            .filter_map(|entry| {
                let content = entry.content.clone()?;
                match entry.role {
                    Role::User => Some(ChatMessage::user(content)),
                    Role::Assistant => Some(ChatMessage::assistant(content)),
                    Role::System | Role::Tool => None,
                }
            })
            .collect()
    }
}

/// Response carrying the assistant's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Final assistant answer
    pub reply: String,

    /// Tool-call rounds used to produce it
    pub rounds: usize,
}

/// Error body; `error` is always a non-empty, user-facing sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
