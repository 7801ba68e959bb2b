//! LLM provider factory.
//!
//! This module turns a resolved [`LlmConfig`] into a provider client. It
//! picks the [`ProviderKind`], translates the config fields into
//! [`ClientOptions`], and calls the matching client constructor.

use biominer_core::{AppError, AppResult, LlmConfig};
use std::sync::Arc;

use crate::client::{ClientOptions, ExtraOptions, LlmClient};
use crate::types::ProviderKind;

/// Create an LLM client for a resolved configuration.
///
/// This function performs the following:
/// 1. Selects the provider variant (`base_url` always means an
///    OpenAI-compatible custom endpoint)
/// 2. Copies model, temperature, token limit and api key into the client
///    options, together with `extra` options passed through verbatim
/// 3. Turns on verbose request/response logging
/// 4. Creates the client implementation
///
/// # Errors
/// Returns error if:
/// - Provider is unknown and no `base_url` is set
/// - The provider's client was compiled out (cargo feature disabled)
///
/// # Example
/// ```no_run
/// use biominer_core::{LlmConfig, LlmConfigInput};
/// use biominer_llm::init_llm;
///
/// let config = LlmConfig::new(LlmConfigInput::new().provider("anthropic"))?;
/// let llm = init_llm(&config, None)?;
/// println!("{} / {}", llm.provider_name(), llm.model());
/// # Ok::<(), biominer_core::AppError>(())
/// ```
pub fn init_llm(config: &LlmConfig, extra: Option<ExtraOptions>) -> AppResult<Arc<dyn LlmClient>> {
    let kind = ProviderKind::for_config(config)?;
    tracing::info!(
        provider = config.provider(),
        kind = kind.as_str(),
        model = config.model(),
        "Initializing LLM client"
    );

    let options = ClientOptions::from_config(config, extra.unwrap_or_default()).with_verbose(true);

    match kind {
        ProviderKind::Custom => custom_client(config, options),
        ProviderKind::OpenAi => openai_client(options),
        ProviderKind::Anthropic => anthropic_client(options),
        ProviderKind::Ollama => ollama_client(options),
        ProviderKind::XAi => xai_client(options),
        ProviderKind::Gemini => gemini_client(options),
    }
}

#[cfg(not(all(
    feature = "openai",
    feature = "anthropic",
    feature = "ollama",
    feature = "xai",
    feature = "gemini"
)))]
fn missing_dependency(kind: ProviderKind) -> AppError {
    tracing::error!(
        "Provider '{}' requires the '{}' cargo feature",
        kind.as_str(),
        kind.cargo_feature()
    );
    AppError::MissingDependency(kind.as_str().to_string())
}

#[cfg(feature = "openai")]
fn custom_client(config: &LlmConfig, options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let base_url = config
        .base_url()
        .ok_or_else(|| AppError::Config("custom provider requires base_url".to_string()))?;
    Ok(Arc::new(crate::providers::OpenAiCompatibleClient::custom(
        config.provider(),
        base_url,
        options,
    )))
}

#[cfg(not(feature = "openai"))]
fn custom_client(_config: &LlmConfig, _options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(missing_dependency(ProviderKind::Custom))
}

#[cfg(feature = "openai")]
fn openai_client(options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Ok(Arc::new(crate::providers::OpenAiCompatibleClient::openai(options)))
}

#[cfg(not(feature = "openai"))]
fn openai_client(_options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(missing_dependency(ProviderKind::OpenAi))
}

#[cfg(feature = "anthropic")]
fn anthropic_client(options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Ok(Arc::new(crate::providers::AnthropicClient::new(options)))
}

#[cfg(not(feature = "anthropic"))]
fn anthropic_client(_options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(missing_dependency(ProviderKind::Anthropic))
}

#[cfg(feature = "ollama")]
fn ollama_client(options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Ok(Arc::new(crate::providers::OllamaClient::new(options)))
}

#[cfg(not(feature = "ollama"))]
fn ollama_client(_options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(missing_dependency(ProviderKind::Ollama))
}

#[cfg(feature = "xai")]
fn xai_client(options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Ok(Arc::new(crate::providers::OpenAiCompatibleClient::xai(options)))
}

#[cfg(not(feature = "xai"))]
fn xai_client(_options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(missing_dependency(ProviderKind::XAi))
}

#[cfg(feature = "gemini")]
fn gemini_client(options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Ok(Arc::new(crate::providers::GeminiClient::new(options)?))
}

#[cfg(not(feature = "gemini"))]
fn gemini_client(_options: ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(missing_dependency(ProviderKind::Gemini))
}
