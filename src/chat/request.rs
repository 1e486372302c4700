//! Wire shapes of the multiplexed `/api/chat` endpoint.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::core::WorkMode;
use crate::llm::ChatTurn;

use super::errors::{ChatError, ChatResult};
use super::transport::ImageOutcome;

/// A decoded request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRequest {
    /// Conversation turn.
    Chat {
        /// Full history, oldest first.
        messages: Vec<ChatTurn>,
        /// Workflow mode selecting the system prompt.
        mode: WorkMode,
    },
    /// Image render request.
    Image {
        /// Model-authored prompt.
        prompt: String,
    },
}

impl ChatRequest {
    /// Decode a raw JSON body.
    ///
    /// A non-empty `generateImagePrompt` wins over `messages`. An unknown
    /// `mode` falls back to `ohisama`.
    ///
    /// # Errors
    /// [`ChatError::MissingMessages`] when `messages` is absent or not an
    /// array, [`ChatError::InvalidRequest`] when its entries are malformed.
    pub fn from_value(body: &Value) -> ChatResult<Self> {
        if let Some(prompt) = body
            .get("generateImagePrompt")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
        {
            return Ok(Self::Image {
                prompt: prompt.to_string(),
            });
        }

        let Some(raw_messages) = body.get("messages").filter(|m| m.is_array()) else {
            return Err(ChatError::MissingMessages);
        };
        let messages: Vec<ChatTurn> = serde_json::from_value(raw_messages.clone())
            .map_err(|e| ChatError::InvalidRequest(e.to_string()))?;
        if messages.is_empty() {
            return Err(ChatError::InvalidRequest("messages must not be empty".to_string()));
        }

        let mode = match body.get("mode").and_then(Value::as_str) {
            None => WorkMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(mode = raw, "unknown mode, using default");
                WorkMode::default()
            }),
        };

        Ok(Self::Chat { messages, mode })
    }
}

/// Successful chat response.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    /// Raw assistant text, JSON blocks included.
    pub message: String,
}

/// Image response; `success: false` is still sent with status 200.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReply {
    /// Whether an image was produced.
    pub success: bool,
    /// Base64 PNG payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    /// Failure text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ImageOutcome> for ImageReply {
    fn from(outcome: ImageOutcome) -> Self {
        match outcome {
            ImageOutcome::Generated(data) => Self {
                success: true,
                image_base64: Some(data),
                error: None,
            },
            ImageOutcome::Failed(reason) => Self {
                success: false,
                image_base64: None,
                error: Some(reason),
            },
        }
    }
}

/// Error body: `{ "error": "..." }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    /// Human-readable message.
    pub error: String,
}

impl From<&ChatError> for ErrorReply {
    fn from(err: &ChatError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
