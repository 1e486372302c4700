//! Gemini `generateContent` client.
//!
//! Behaviour:
//! - Chat: prior turns go out as text parts (`user` / `model` roles); the
//!   inline image, if any, is attached to the last turn only.
//! - Image: the prompt is wrapped in the house style and the first inline
//!   data part of the answer is returned as base64.
//! - HTTP 429 or a `RESOURCE_EXHAUSTED` body maps to [`LlmError::RateLimited`].

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::core::Role;
use crate::core::image::UPLOAD_MIME;

use super::errors::{LlmError, LlmResult};
use super::prompts::image_prompt;
use super::{ChatTurn, GenerativeModel, LlmFuture};

/// Longest provider error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 400;
/// Header carrying the API key; keeps it out of URLs and error text.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent<'a>>,
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataRef<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataRef<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .take(1)
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }

    fn first_image(&self) -> Option<String> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .filter_map(|inline| inline.data.clone())
            .find(|data| !data.is_empty())
    }
}

const fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_chat_request<'a>(system_prompt: &'a str, turns: &'a [ChatTurn]) -> GenerateContentRequest<'a> {
    let last = turns.len().saturating_sub(1);
    let contents = turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let mut parts = Vec::with_capacity(2);
            if i == last {
                if let Some(data) = turn.image_base64.as_deref() {
                    parts.push(RequestPart::Inline {
                        inline_data: InlineDataRef {
                            mime_type: UPLOAD_MIME,
                            data,
                        },
                    });
                }
            }
            parts.push(RequestPart::Text {
                text: &turn.content,
            });
            RequestContent {
                role: Some(wire_role(turn.role)),
                parts,
            }
        })
        .collect();

    GenerateContentRequest {
        system_instruction: Some(RequestContent {
            role: None,
            parts: vec![RequestPart::Text {
                text: system_prompt,
            }],
        }),
        contents,
        generation_config: None,
    }
}

fn build_image_request(wrapped_prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        system_instruction: None,
        contents: vec![RequestContent {
            role: Some("user"),
            parts: vec![RequestPart::Text {
                text: wrapped_prompt,
            }],
        }],
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["TEXT", "IMAGE"],
        }),
    }
}

fn is_rate_limit_body(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("resource_exhausted") || lowered.contains("resource exhausted")
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// REST client for the Gemini API.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> LlmResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.config.api_base, model_path)
    }

    async fn post_generate(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> LlmResult<GenerateContentResponse> {
        let api_key = self.api_key()?;
        let endpoint = self.endpoint_for_model(model);
        debug!(model, "gemini generateContent");

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<GenerateContentResponse>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS || is_rate_limit_body(&body) {
            warn!(status = status.as_u16(), "gemini rate limited");
            return Err(LlmError::RateLimited(truncate(&body)));
        }
        Err(LlmError::HttpStatus {
            status: status.as_u16(),
            body: truncate(&body),
        })
    }
}

impl GenerativeModel for GeminiClient {
    fn complete_chat<'a>(
        &'a self,
        system_prompt: &'a str,
        turns: &'a [ChatTurn],
    ) -> LlmFuture<'a, LlmResult<String>> {
        Box::pin(async move {
            let request = build_chat_request(system_prompt, turns);
            let response = self.post_generate(&self.config.chat_model, &request).await?;
            response
                .text()
                .ok_or_else(|| LlmError::MalformedResponse("no text in response".to_string()))
        })
    }

    fn generate_image<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a, LlmResult<Option<String>>> {
        Box::pin(async move {
            let wrapped = image_prompt(prompt);
            let request = build_image_request(&wrapped);
            let response = self.post_generate(&self.config.image_model, &request).await?;
            Ok(response.first_image())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_maps_roles_and_attaches_image_to_last_turn() {
        let turns = vec![
            ChatTurn {
                role: Role::User,
                content: "first".to_string(),
                image_base64: Some("OLD".to_string()),
            },
            ChatTurn::text(Role::Assistant, "reply"),
            ChatTurn {
                role: Role::User,
                content: "latest".to_string(),
                image_base64: Some("NEW".to_string()),
            },
        ];
        let value = serde_json::to_value(build_chat_request("system", &turns)).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "system");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(value["contents"][1]["role"], "model");
        let last_parts = value["contents"][2]["parts"].as_array().unwrap();
        assert_eq!(last_parts[0]["inlineData"]["data"], "NEW");
        assert_eq!(last_parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(last_parts[1]["text"], "latest");
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_image_request_asks_for_image_modality() {
        let value = serde_json::to_value(build_image_request("a plate")).unwrap();
        assert_eq!(value["generationConfig"]["responseModalities"][1], "IMAGE");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "a plate");
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_and_image_extraction() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here "},
                        {"inlineData": {"mimeType": "image/png", "data": "QUJD"}},
                        {"text": "you go"}
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Here you go"));
        assert_eq!(response.first_image().as_deref(), Some("QUJD"));
    }

    #[test]
    fn test_empty_response_yields_nothing() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(response.text().is_none());
        assert!(response.first_image().is_none());
    }

    #[test]
    fn test_rate_limit_body_detection() {
        assert!(is_rate_limit_body(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#));
        assert!(is_rate_limit_body("Resource exhausted, slow down"));
        assert!(!is_rate_limit_body("invalid argument"));
    }

    #[test]
    fn test_missing_api_key() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(matches!(client.api_key(), Err(LlmError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let config = GeminiConfig {
            api_key: Some("SECRET_KEY_123".to_string()),
            api_base: "http://127.0.0.1:1/v1beta".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();

        let err = client
            .complete_chat("system", &[ChatTurn::text(Role::User, "hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
        assert!(!err.to_string().contains("SECRET_KEY_123"), "{err}");
        assert!(!format!("{err:?}").contains("SECRET_KEY_123"));

        let chat_text = crate::chat::ChatError::from(err).to_string();
        assert!(chat_text.starts_with("An error occurred: "));
        assert!(!chat_text.contains("SECRET_KEY_123"));
    }

    #[test]
    fn test_endpoint_for_model() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert_eq!(
            client.endpoint_for_model("gemini-2.0-flash-exp"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
        assert!(client.endpoint_for_model("models/x").ends_with("/models/x:generateContent"));
    }
}
