//! Generative-language API collaborator.
//!
//! The rest of the crate depends only on [`GenerativeModel`]: "given history
//! and an optional image, return text" and "given a prompt, return image
//! bytes or nothing".

pub mod errors;
pub mod gemini;
pub mod prompts;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::core::Role;

pub use errors::{LlmError, LlmResult};
pub use gemini::GeminiClient;

/// Boxed future type for model calls.
pub type LlmFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One prior turn of the conversation as sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Inline image payload (base64, JPEG).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl ChatTurn {
    /// Text-only turn.
    #[must_use]
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            image_base64: None,
        }
    }
}

/// Text and image completion service.
pub trait GenerativeModel: Send + Sync {
    /// Produce the next assistant reply for `turns` under `system_prompt`.
    ///
    /// # Errors
    /// Returns an error if the provider call fails or yields no text.
    fn complete_chat<'a>(
        &'a self,
        system_prompt: &'a str,
        turns: &'a [ChatTurn],
    ) -> LlmFuture<'a, LlmResult<String>>;

    /// Render an image for `prompt`. `Ok(None)` means the model declined to produce one.
    ///
    /// # Errors
    /// Returns an error if the provider call fails.
    fn generate_image<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a, LlmResult<Option<String>>>;
}
