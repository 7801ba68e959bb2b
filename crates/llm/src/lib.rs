//! LLM client construction for BioMiner.
//!
//! This crate turns a resolved [`biominer_core::LlmConfig`] into a provider
//! client behind the [`LlmClient`] trait.
//!
//! # Providers
//! - **OpenAI** and any OpenAI-compatible `base_url` endpoint
//! - **Anthropic**
//! - **Ollama**: local runtime
//! - **xAI**
//! - **Gemini**
//!
//! Each provider sits behind a cargo feature of the same name; all are on
//! by default.
//!
//! # Example
//! ```no_run
//! use biominer_core::{LlmConfig, LlmConfigInput};
//! use biominer_llm::{get_tokens_usage, init_llm, ChatMessage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LlmConfig::new(LlmConfigInput::new().provider("openai").model("gpt-4o-mini"))?;
//! let llm = init_llm(&config, None)?;
//! let response = llm
//!     .invoke(&[
//!         ChatMessage::system("You are a helpful calculator."),
//!         ChatMessage::user("1 + 1 = ?"),
//!     ])
//!     .await?;
//! println!("{} {:?}", response.content, get_tokens_usage(&response));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;
pub mod usage;

// Re-export main types
pub use client::{
    ChatMessage, ChatResponse, ClientOptions, ExtraOptions, LlmClient, LlmUsage, Role,
};
pub use factory::init_llm;
pub use types::{FieldMap, ProviderKind};
pub use usage::get_tokens_usage;
