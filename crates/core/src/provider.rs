//! The set of providers known by name.

use std::fmt;
use std::str::FromStr;

/// Provider name assigned when only a `base_url` identifies the endpoint.
pub const CUSTOM_PROVIDER: &str = "custom";

/// A provider that can be used without a `base_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownProvider {
    OpenAi,
    Anthropic,
    Ollama,
    XAi,
    Gemini,
}

impl KnownProvider {
    pub const ALL: [KnownProvider; 5] = [
        KnownProvider::OpenAi,
        KnownProvider::Anthropic,
        KnownProvider::Ollama,
        KnownProvider::XAi,
        KnownProvider::Gemini,
    ];

    /// Parse an exact provider name. Matching is case sensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            "ollama" => Some(Self::Ollama),
            "xai" => Some(Self::XAi),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// Canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::XAi => "xai",
            Self::Gemini => "gemini",
        }
    }

    /// Key looked up in the merged input, e.g. `openai_api_key`.
    pub fn api_key_input_key(&self) -> String {
        format!("{}_api_key", self.as_str())
    }

    /// Fallback environment variable, e.g. `OPENAI_API_KEY`.
    pub fn api_key_env_var(&self) -> String {
        format!("{}_API_KEY", self.as_str().to_uppercase())
    }
}

impl FromStr for KnownProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

impl fmt::Display for KnownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        for provider in KnownProvider::ALL {
            assert_eq!(KnownProvider::parse(provider.as_str()), Some(provider));
        }
        assert_eq!(KnownProvider::parse("custom"), None);
        assert_eq!(KnownProvider::parse("claude"), None);
        assert!("biominer".parse::<KnownProvider>().is_err());
    }

    #[test]
    fn test_api_key_names() {
        assert_eq!(KnownProvider::XAi.api_key_env_var(), "XAI_API_KEY");
        assert_eq!(KnownProvider::Gemini.api_key_input_key(), "gemini_api_key");
    }
}
