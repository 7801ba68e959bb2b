//! LLM provider implementations.
//!
//! Each client turns messages into its provider's request body using the
//! variant's [`FieldMap`](crate::types::FieldMap), sends one HTTP request
//! and maps the reply to a [`ChatResponse`](crate::client::ChatResponse).

#[cfg(any(
    feature = "openai",
    feature = "anthropic",
    feature = "ollama",
    feature = "xai",
    feature = "gemini"
))]
mod common;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(any(feature = "openai", feature = "xai"))]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicClient;
#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;
#[cfg(any(feature = "openai", feature = "xai"))]
pub use openai::OpenAiCompatibleClient;
