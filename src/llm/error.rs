//! Completion provider errors.

use thiserror::Error;

/// Failure talking to the completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("provider returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidResponse(_) | Self::EmptyResponse => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}
