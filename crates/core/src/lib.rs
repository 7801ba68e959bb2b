//! BioMiner Core Library
//!
//! This crate resolves the LLM configuration record and provides the
//! foundational utilities shared by the other crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Layered configuration sources and the resolved `LlmConfig`
//! - The opaque `SecretString` type

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod secret;
pub mod sources;

// Re-export commonly used types
pub use config::{ConfigSources, LlmConfig, LlmConfigInput};
pub use error::{AppError, AppResult};
pub use provider::KnownProvider;
pub use secret::SecretString;
pub use sources::{Environment, RawInput};
