//! Capability interface the reconciler uses to talk to the model.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::core::WorkMode;
use crate::llm::ChatTurn;

use super::errors::ChatResult;

/// Fixed text returned when the model produced no image.
pub const IMAGE_FAILURE_TEXT: &str = "Image generation failed";

/// Boxed future type for transport calls.
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of an image request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ImageOutcome {
    /// Base64 PNG payload.
    Generated(String),
    /// The model declined or failed; carries the user-facing reason.
    Failed(String),
}

impl ImageOutcome {
    /// Generic failure outcome.
    #[must_use]
    pub fn failed() -> Self {
        Self::Failed(IMAGE_FAILURE_TEXT.to_string())
    }
}

/// "Send history, get reply" and "send prompt, get image".
pub trait ChatTransport: Send + Sync {
    /// Next assistant reply for `turns` in `mode`.
    ///
    /// # Errors
    /// Returns a [`super::ChatError`] when the request is unusable or the provider fails.
    fn reply<'a>(&'a self, mode: WorkMode, turns: &'a [ChatTurn]) -> ChatFuture<'a, ChatResult<String>>;

    /// Render an image for `prompt`.
    ///
    /// # Errors
    /// Only rate-limit exhaustion and missing configuration are errors;
    /// other failures come back as [`ImageOutcome::Failed`].
    fn generate_image<'a>(&'a self, prompt: &'a str) -> ChatFuture<'a, ChatResult<ImageOutcome>>;
}
