//! Provider dispatch types.
//!
//! [`ProviderKind`] is the tagged form of a resolved provider. Each variant
//! carries its own [`FieldMap`]: where the model, temperature and token
//! limit go in that provider's request body.

use biominer_core::{AppError, AppResult, KnownProvider, LlmConfig};

/// Request-body locations of the generic config fields.
///
/// Paths use `.` for nesting, so `options.temperature` lands in
/// `{"options": {"temperature": ..}}`. `None` means the provider has no
/// such body field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub model: Option<&'static str>,
    pub temperature: &'static str,
    pub max_tokens: Option<&'static str>,
}

/// Provider variant selected by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Ollama,
    XAi,
    Gemini,
    /// Any OpenAI-compatible endpoint addressed through `base_url`
    Custom,
}

impl ProviderKind {
    /// Pick the variant for a resolved config.
    ///
    /// A `base_url` always selects [`ProviderKind::Custom`], whatever the
    /// provider string says.
    pub fn for_config(config: &LlmConfig) -> AppResult<Self> {
        if config.base_url().is_some() {
            return Ok(Self::Custom);
        }

        config
            .known_provider()
            .map(Self::from)
            .ok_or_else(|| AppError::UnsupportedProvider(config.provider().to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::XAi => "xai",
            Self::Gemini => "gemini",
            Self::Custom => "custom",
        }
    }

    /// Cargo feature that compiles this provider's client.
    pub fn cargo_feature(&self) -> &'static str {
        match self {
            Self::Custom => "openai",
            other => other.as_str(),
        }
    }

    pub fn field_map(&self) -> FieldMap {
        match self {
            Self::OpenAi | Self::Custom => FieldMap {
                model: Some("model"),
                temperature: "temperature",
                max_tokens: Some("max_completion_tokens"),
            },
            Self::Anthropic | Self::XAi => FieldMap {
                model: Some("model"),
                temperature: "temperature",
                max_tokens: Some("max_tokens"),
            },
            Self::Ollama => FieldMap {
                model: Some("model"),
                temperature: "options.temperature",
                max_tokens: None,
            },
            Self::Gemini => FieldMap {
                model: None,
                temperature: "generationConfig.temperature",
                max_tokens: Some("generationConfig.maxOutputTokens"),
            },
        }
    }

    /// Built-in endpoint; `None` for custom endpoints.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Self::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            Self::Ollama => Some("http://localhost:11434/api/chat"),
            Self::XAi => Some("https://api.x.ai/v1/chat/completions"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/models"),
            Self::Custom => None,
        }
    }
}

impl From<KnownProvider> for ProviderKind {
    fn from(provider: KnownProvider) -> Self {
        match provider {
            KnownProvider::OpenAi => Self::OpenAi,
            KnownProvider::Anthropic => Self::Anthropic,
            KnownProvider::Ollama => Self::Ollama,
            KnownProvider::XAi => Self::XAi,
            KnownProvider::Gemini => Self::Gemini,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biominer_core::{ConfigSources, Environment, LlmConfigInput};

    fn config(input: LlmConfigInput) -> LlmConfig {
        let sources = ConfigSources::new(input)
            .with_environment(Environment::default())
            .without_env_file();
        LlmConfig::resolve(&sources).unwrap()
    }

    #[test]
    fn test_kind_from_provider() {
        for provider in KnownProvider::ALL {
            let kind = ProviderKind::for_config(&config(
                LlmConfigInput::new().provider(provider.as_str()).api_key("k"),
            ))
            .unwrap();
            assert_eq!(kind.as_str(), provider.as_str());
        }
    }

    #[test]
    fn test_base_url_selects_custom() {
        let kind = ProviderKind::for_config(&config(
            LlmConfigInput::new()
                .provider("biominer")
                .base_url("https://open.bigmodel.cn/api/paas/v4/")
                .api_key("k"),
        ))
        .unwrap();
        assert_eq!(kind, ProviderKind::Custom);
    }

    #[test]
    fn test_token_field_names() {
        assert_eq!(
            ProviderKind::OpenAi.field_map().max_tokens,
            Some("max_completion_tokens")
        );
        assert_eq!(ProviderKind::Anthropic.field_map().max_tokens, Some("max_tokens"));
        assert_eq!(ProviderKind::XAi.field_map().max_tokens, Some("max_tokens"));
        assert_eq!(ProviderKind::Ollama.field_map().max_tokens, None);
        assert_eq!(
            ProviderKind::Gemini.field_map().max_tokens,
            Some("generationConfig.maxOutputTokens")
        );
    }

    #[test]
    fn test_custom_needs_openai_feature() {
        assert_eq!(ProviderKind::Custom.cargo_feature(), "openai");
        assert_eq!(ProviderKind::Gemini.cargo_feature(), "gemini");
        assert!(ProviderKind::Custom.default_endpoint().is_none());
    }
}
