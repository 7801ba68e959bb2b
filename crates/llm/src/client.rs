//! LLM client abstraction and message/response types.
//!
//! Every provider client accepts a sequence of role-tagged messages and
//! returns a [`ChatResponse`] that may carry token usage.

use biominer_core::{AppResult, LlmConfig, SecretString};
use serde::{Deserialize, Serialize};

/// Provider-specific options merged verbatim into every request body.
pub type ExtraOptions = serde_json::Map<String, serde_json::Value>;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Response of a single chat invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics, when the provider reports them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Settings handed to a provider client constructor.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub api_key: SecretString,
    pub extra: ExtraOptions,
    /// Log request and response bodies at debug level
    pub verbose: bool,
}

impl ClientOptions {
    pub fn from_config(config: &LlmConfig, extra: ExtraOptions) -> Self {
        Self {
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            api_key: config.api_key().clone(),
            extra,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Trait for LLM providers.
///
/// Retries, streaming and rate limiting are left to the provider API; a
/// call maps to exactly one HTTP request.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name (e.g., "ollama", "custom").
    fn provider_name(&self) -> &str;

    /// Model every request is sent to.
    fn model(&self) -> &str;

    /// Whether request and response bodies are logged.
    fn is_verbose(&self) -> bool;

    /// Send the conversation and return the model's reply.
    async fn invoke(&self, messages: &[ChatMessage]) -> AppResult<ChatResponse>;
}
