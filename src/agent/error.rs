//! Errors surfaced by a chat.

use thiserror::Error;

use crate::config::ConfigError;
use crate::llm::{ChatMessage, LlmError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("completion provider error: {0}")]
    Provider(#[from] LlmError),

    /// The model kept requesting tools past the round budget.
    #[error("tool-call budget of {max_rounds} rounds exceeded")]
    LoopBudgetExceeded {
        max_rounds: usize,
        transcript: Vec<ChatMessage>,
    },

    #[error("chat cancelled")]
    Cancelled { transcript: Vec<ChatMessage> },
}

impl AgentError {
    /// Transcript accumulated before the failure, when the loop kept one.
    pub fn partial_transcript(&self) -> Option<&[ChatMessage]> {
        match self {
            Self::LoopBudgetExceeded { transcript, .. } | Self::Cancelled { transcript } => {
                Some(transcript)
            }
            Self::Configuration(_) | Self::Provider(_) => None,
        }
    }

    /// One clear sentence suitable for showing to the person chatting.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => {
                "The assistant is not configured correctly. Please contact the site owner.".to_string()
            }
            Self::Provider(LlmError::RateLimited(_)) => {
                "The assistant is handling too many requests right now. Please try again in a moment."
                    .to_string()
            }
            Self::Provider(_) => {
                "The assistant could not reach its language model. Please try again.".to_string()
            }
            Self::LoopBudgetExceeded { max_rounds, .. } => format!(
                "The assistant could not finish its answer within {} tool steps. Please try rephrasing your question.",
                max_rounds
            ),
            Self::Cancelled { .. } => "The request was cancelled before an answer was ready.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_non_empty_user_message() {
        let errors = vec![
            AgentError::Configuration(ConfigError::MissingEnvVar("PERSONA_NAME".to_string())),
            AgentError::Provider(LlmError::Timeout),
            AgentError::Provider(LlmError::RateLimited("429".to_string())),
            AgentError::LoopBudgetExceeded {
                max_rounds: 3,
                transcript: Vec::new(),
            },
            AgentError::Cancelled {
                transcript: Vec::new(),
            },
        ];
        for err in errors {
            assert!(!err.user_message().trim().is_empty(), "{err:?}");
        }
    }

    #[test]
    fn budget_error_keeps_transcript() {
        let err = AgentError::LoopBudgetExceeded {
            max_rounds: 1,
            transcript: vec![ChatMessage::system("s"), ChatMessage::user("u")],
        };
        assert_eq!(err.partial_transcript().map(<[_]>::len), Some(2));
        assert!(err.user_message().contains('1'));
        assert!(AgentError::Provider(LlmError::Timeout).partial_transcript().is_none());
    }
}
