//! [`ChatTransport`] backed by a [`GenerativeModel`], with rate-limit retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::core::WorkMode;
use crate::llm::prompts::system_prompt;
use crate::llm::{ChatTurn, GenerativeModel, LlmError, LlmResult};

use super::errors::{ChatError, ChatResult};
use super::transport::{ChatFuture, ChatTransport, ImageOutcome};

/// Rate-limit class: the typed variant (HTTP 429 is mapped there by the
/// client), or error text reporting an exhausted resource.
fn is_rate_limit(err: &LlmError) -> bool {
    if err.is_rate_limited() {
        return true;
    }
    let text = err.to_string().to_ascii_lowercase();
    text.contains("resource exhausted") || text.contains("resource_exhausted")
}

/// Chat and image calls against a model, retried on rate limits.
#[derive(Clone)]
pub struct ChatService {
    model: Arc<dyn GenerativeModel>,
    retry_delays: Vec<Duration>,
}

impl ChatService {
    /// Create a service. `retry_delays` holds the wait before each retry;
    /// its length is the number of retries.
    #[must_use]
    pub fn new(model: Arc<dyn GenerativeModel>, retry_delays: Vec<Duration>) -> Self {
        Self {
            model,
            retry_delays,
        }
    }

    async fn with_retry<T, F, Fut>(&self, what: &'static str, mut call: F) -> LlmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LlmResult<T>>,
    {
        let mut attempt = 0usize;
        loop {
            match call().await {
                Err(err) if is_rate_limit(&err) && attempt < self.retry_delays.len() => {
                    let delay = self.retry_delays[attempt];
                    attempt += 1;
                    warn!(
                        what,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) if is_rate_limit(&err) => {
                    return Err(LlmError::RateLimited(err.to_string()));
                }
                other => return other,
            }
        }
    }
}

impl ChatTransport for ChatService {
    fn reply<'a>(&'a self, mode: WorkMode, turns: &'a [ChatTurn]) -> ChatFuture<'a, ChatResult<String>> {
        Box::pin(async move {
            if turns.is_empty() {
                return Err(ChatError::InvalidRequest("messages must not be empty".to_string()));
            }
            let prompt = system_prompt(mode);
            let text = self
                .with_retry("chat", || self.model.complete_chat(prompt, turns))
                .await
                .map_err(|err| {
                    error!(error = %err, "chat completion failed");
                    ChatError::from(err)
                })?;
            info!(mode = mode.as_str(), turns = turns.len(), "chat reply");
            Ok(text)
        })
    }

    fn generate_image<'a>(&'a self, prompt: &'a str) -> ChatFuture<'a, ChatResult<ImageOutcome>> {
        Box::pin(async move {
            match self
                .with_retry("image", || self.model.generate_image(prompt))
                .await
            {
                Ok(Some(data)) => {
                    info!(bytes = data.len(), "image generated");
                    Ok(ImageOutcome::Generated(data))
                }
                Ok(None) => {
                    warn!("model returned no image");
                    Ok(ImageOutcome::failed())
                }
                Err(err @ (LlmError::RateLimited(_) | LlmError::MissingApiKey)) => Err(err.into()),
                Err(err) => {
                    error!(error = %err, "image generation failed");
                    Ok(ImageOutcome::failed())
                }
            }
        })
    }
}
