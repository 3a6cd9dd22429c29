//! Redline LLM Provider Layer
//!
//! Chat-completion providers used by the pipeline stages.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions over HTTP
//!
//! # Examples
//!
//! ```
//! use redline_llm::{ChatProvider, ChatRequest, MockProvider};
//!
//! let provider = MockProvider::new(r#"{"title": "Lease"}"#);
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let response = rt.block_on(provider.complete(ChatRequest::user("Parse this"))).unwrap();
//! assert_eq!(response.content, r#"{"title": "Lease"}"#);
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use redline_domain::StageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Non-success HTTP status or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Service could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Classify into the pipeline taxonomy, tagging the calling stage
    pub fn into_stage_error(self, stage: &str) -> StageError {
        let stage = stage.to_string();
        match self {
            LlmError::RateLimitExceeded(message) => StageError::RateLimited { stage, message },
            LlmError::Timeout(message) => StageError::Timeout { stage, message },
            LlmError::Connection(message) => StageError::Connection { stage, message },
            LlmError::InvalidResponse(message) => StageError::MalformedResponse { stage, message },
            LlmError::ModelNotAvailable(model) => StageError::Service {
                stage,
                message: format!("model not available: {}", model),
            },
            LlmError::Communication(message) | LlmError::Other(message) => {
                StageError::Service { stage, message }
            }
        }
    }
}

/// Chat role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// Request content
    User,
}

/// One piece of message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// Image, usually a base64 `data:` URL
    ImageUrl {
        /// Image location and fidelity
        image_url: ImageUrl,
    },
}

/// Image reference inside a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// `data:` or `https:` URL
    pub url: String,
    /// Requested fidelity (`high`, `low`, `auto`)
    pub detail: String,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who is speaking
    pub role: Role,
    /// Message body
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    /// System message with text content
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// User message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// User message with text followed by an image
    pub fn user_with_image(text: impl Into<String>, url: impl Into<String>, detail: &str) -> Self {
        Self {
            role: Role::User,
            content: vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: url.into(),
                        detail: detail.to_string(),
                    },
                },
            ],
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A chat-completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Conversation, system message first
    pub messages: Vec<ChatMessage>,
    /// Completion token cap
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Ask for a JSON object response
    pub json_mode: bool,
}

impl ChatRequest {
    /// Request from explicit messages
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: None,
            json_mode: false,
        }
    }

    /// Single user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(text)])
    }

    /// Set the completion token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Request a JSON object response
    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Text of every message, joined
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(ChatMessage::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Token accounting for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens
    pub prompt_tokens: u32,
    /// Output tokens
    pub completion_tokens: u32,
}

/// A chat-completion response
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Text of the first choice
    pub content: String,
    /// Token usage, when reported
    pub usage: Option<Usage>,
}

/// A chat-completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Model identifier, for trace records
    fn model(&self) -> &str;
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// A keyed response is used when its key occurs anywhere in the prompt text;
/// otherwise the default response is returned. Every request is recorded.
///
/// # Examples
///
/// ```
/// use redline_llm::{ChatProvider, ChatRequest, MockProvider};
///
/// let mut provider = MockProvider::default();
/// provider.add_response("ORIGINAL", r#"{"title": "A"}"#);
/// provider.add_response("AMENDMENT", r#"{"title": "B"}"#);
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let reply = rt.block_on(provider.complete(ChatRequest::user("the AMENDMENT"))).unwrap();
/// assert_eq!(reply.content, r#"{"title": "B"}"#);
/// assert_eq!(provider.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, MockReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `response` whenever `key` occurs in the prompt
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(key.into(), MockReply::Text(response.into()));
    }

    /// Fail with `error` whenever `key` occurs in the prompt
    pub fn add_error(&mut self, key: impl Into<String>, error: LlmError) {
        lock(&self.responses).insert(key.into(), MockReply::Fail(error));
    }

    /// Number of completed calls
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        lock(&self.requests).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let prompt = request.prompt_text();
        lock(&self.requests).push(request);

        let reply = {
            let responses = lock(&self.responses);
            // Longest matching key wins so overlapping keys stay deterministic
            responses
                .iter()
                .filter(|(key, _)| prompt.contains(key.as_str()))
                .max_by_key(|(key, _)| key.len())
                .map(|(_, reply)| reply.clone())
        };

        match reply {
            Some(MockReply::Fail(error)) => Err(error),
            Some(MockReply::Text(content)) => Ok(ChatResponse {
                content,
                usage: Some(Usage::default()),
            }),
            None => Ok(ChatResponse {
                content: self.default_response.clone(),
                usage: Some(Usage::default()),
            }),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
