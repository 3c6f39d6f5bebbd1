//! Text-completion collaborator
//!
//! The assistant never depends on a concrete model provider. Anything that can
//! turn a prompt into text implements [`CompletionBackend`]; the bundled
//! [`OpenAiCompatibleBackend`] speaks the `/chat/completions` wire format.

use crate::config::AssistantConfig;
use async_trait::async_trait;
use mindscreen_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

/// Trait for text-completion providers
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete the prompt, returning the raw model text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatCompletionMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionReply,
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    content: Option<String>,
}

/// Backend for any OpenAI-compatible chat completion API
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: impl AsRef<str>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.as_ref().trim_end_matches('/')),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        Self::new(&config.base_url, config.model.clone(), config.api_key())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: [ChatCompletionMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut call = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| Error::completion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::completion(format!("endpoint returned {status}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::completion(format!("malformed completion body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::completion("completion had no content"))?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        let backend =
            OpenAiCompatibleBackend::new("http://localhost:8080/v1/", "m", None).unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = CompletionRequest::new("hi", 0.6, 1200);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["maxTokens"], 1200);
    }

    #[test]
    fn test_response_body_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_completion_error() {
        let backend = OpenAiCompatibleBackend::new("http://127.0.0.1:9", "m", None).unwrap();
        let err = backend
            .complete(&CompletionRequest::new("hi", 0.6, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Completion(_)));
    }
}
