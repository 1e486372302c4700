//! Error taxonomy of the chat endpoint.

use thiserror::Error;

use crate::llm::LlmError;

/// Diagnostic returned when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str =
    "The generative API key is not configured. Set GEMINI_API_KEY and restart the server.";

/// Message returned once rate-limit retries are exhausted.
pub const RATE_LIMITED_MESSAGE: &str =
    "The AI service is busy right now. Please wait a moment and try again later.";

/// Chat transport errors, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum ChatError {
    /// `messages` absent or not an array.
    #[error("messages is required")]
    MissingMessages,
    /// Request body present but unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Provider still rate limited after every retry.
    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,
    /// Credential missing.
    #[error("{}", MISSING_KEY_MESSAGE)]
    Configuration,
    /// Any other provider failure.
    #[error("An error occurred: {0}")]
    Upstream(String),
}

impl ChatError {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingMessages | Self::InvalidRequest(_) => 400,
            Self::RateLimited => 429,
            Self::Configuration | Self::Upstream(_) => 500,
        }
    }
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited(_) => Self::RateLimited,
            LlmError::MissingApiKey => Self::Configuration,
            other => Self::Upstream(other.to_string()),
        }
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
