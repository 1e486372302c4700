//! Error types for the generative API client.

use thiserror::Error;

/// Generative client error type.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level HTTP failure. The request URL is stripped.
    #[error("http client error: {0}")]
    Http(reqwest::Error),
    /// Provider refused the call because of quota or rate limits (HTTP 429 / resource exhausted).
    #[error("rate limited by provider: {0}")]
    RateLimited(String),
    /// No API key configured.
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,
    /// Provider answered with a non-success status.
    #[error("provider http status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// Provider answered 200 but the payload was unusable.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl LlmError {
    /// Whether this failure belongs to the rate-limit class that callers may retry.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Convenience result alias for generative client calls.
pub type LlmResult<T> = Result<T, LlmError>;
