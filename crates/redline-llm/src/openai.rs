//! OpenAI-compatible Provider Implementation
//!
//! Talks to any `/chat/completions` endpoint that follows the OpenAI wire
//! format. There is no retry: the first failure is returned, classified.
//!
//! # Examples
//!
//! ```no_run
//! use redline_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...", "gpt-5.2").unwrap();
//! ```

use crate::{ChatMessage, ChatProvider, ChatRequest, ChatResponse, LlmError, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a single completion (vision calls are slow)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Chat-completion provider over HTTP
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider against the default endpoint
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Other` if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_options(
            DEFAULT_BASE_URL,
            api_key,
            model,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a provider with an explicit endpoint and timeout
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    fn classify_transport(e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_connect() {
            LlmError::Connection(e.to_string())
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

/// Map a non-success status to an error
fn classify_status(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded(body),
        reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        reqwest::StatusCode::REQUEST_TIMEOUT | reqwest::StatusCode::GATEWAY_TIMEOUT => {
            LlmError::Timeout(format!("HTTP {}: {}", status, body))
        }
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Pull the first choice's text out of a response body
fn first_choice(body: &str) -> Result<ChatResponse, LlmError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            LlmError::InvalidResponse("response contained no message content".to_string())
        })?;

    Ok(ChatResponse {
        content,
        usage: parsed.usage,
    })
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(model = %self.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(Self::classify_transport)?;

        if !status.is_success() {
            return Err(classify_status(status, text, &self.model));
        }

        first_choice(&text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into(), "m"),
            LlmError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LlmError::ModelNotAvailable(ref m) if m == "gpt-x"
        ));
        assert!(matches!(
            classify_status(StatusCode::GATEWAY_TIMEOUT, String::new(), "m"),
            LlmError::Timeout(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops".into(), "m"),
            LlmError::Communication(_)
        ));
    }

    #[test]
    fn test_first_choice_extracts_content_and_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }"#;
        let response = first_choice(body).unwrap();
        assert_eq!(response.content, r#"{"ok": true}"#);
        assert_eq!(response.usage, Some(Usage { prompt_tokens: 12, completion_tokens: 5 }));
    }

    #[test]
    fn test_first_choice_rejects_empty_or_garbage() {
        assert!(matches!(first_choice(r#"{"choices": []}"#), Err(LlmError::InvalidResponse(_))));
        assert!(matches!(first_choice("<html>"), Err(LlmError::InvalidResponse(_))));
        assert!(matches!(
            first_choice(r#"{"choices": [{"message": {"content": null}}]}"#),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest::new(vec![ChatMessage::system("s"), ChatMessage::user("u")])
            .with_max_tokens(4096)
            .with_temperature(0.0)
            .json();
        let body = CompletionRequest {
            model: "gpt-5.2",
            messages: &request.messages,
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "gpt-5.2");
        assert_eq!(value["max_completion_tokens"], 4096);
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let timeout = Duration::from_secs(1);
        let provider =
            OpenAiProvider::with_options("http://localhost:9999/v1/", "k", "m", timeout).unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
        assert_eq!(provider.model(), "m");
    }
}
