//! LLM configuration resolution.
//!
//! This module merges configuration from multiple sources into one
//! validated, immutable [`LlmConfig`]:
//! - Explicit arguments ([`LlmConfigInput`])
//! - The `BIOMINER_AI_LLM_*` environment namespace
//! - An optional `.env` file (path overridable by `BIOMINER_AI_ENV`)
//! - `{PROVIDER}_API_KEY` environment variables, for the api key only
//!
//! Higher layers win key by key: explicit > environment namespace > file >
//! built-in default.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::provider::{KnownProvider, CUSTOM_PROVIDER};
use crate::secret::SecretString;
use crate::sources::{load_env_file, Environment, RawInput};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Keys that make up the configuration record. Everything else is dropped.
pub const RECORD_FIELDS: [&str; 6] = [
    "provider",
    "model",
    "temperature",
    "max_tokens",
    "api_key",
    "base_url",
];

/// Explicit configuration arguments.
///
/// Values are kept as strings and validated during resolution, so an
/// explicit `max_tokens(-10)` fails the same way `BIOMINER_AI_LLM_MAX_TOKENS=-10`
/// does.
///
/// # Example
/// ```
/// use biominer_core::LlmConfigInput;
///
/// let input = LlmConfigInput::new()
///     .provider("anthropic")
///     .api_key("k1")
///     .temperature(1.0)
///     .max_tokens(1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LlmConfigInput {
    values: RawInput,
}

impl LlmConfigInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build input from an arbitrary key-value map.
    pub fn from_map<I, K, V>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            values: map.into_iter().collect(),
        }
    }

    pub fn provider(self, provider: impl Into<String>) -> Self {
        self.set("provider", provider)
    }

    pub fn model(self, model: impl Into<String>) -> Self {
        self.set("model", model)
    }

    pub fn temperature(self, temperature: f32) -> Self {
        self.set("temperature", temperature.to_string())
    }

    pub fn max_tokens(self, max_tokens: i64) -> Self {
        self.set("max_tokens", max_tokens.to_string())
    }

    pub fn api_key(self, api_key: impl Into<String>) -> Self {
        self.set("api_key", api_key)
    }

    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        self.set("base_url", base_url)
    }

    /// Set any key, e.g. `openai_api_key`. Keys outside the record are
    /// accepted here and dropped during resolution.
    pub fn set(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.values.insert(key, value);
        self
    }

    pub fn as_raw(&self) -> &RawInput {
        &self.values
    }
}

#[derive(Debug, Clone)]
enum EnvFileSource {
    /// `$BIOMINER_AI_ENV`, falling back to `.env`
    Default,
    Path(PathBuf),
    Disabled,
}

/// Everything resolution reads from.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    explicit: LlmConfigInput,
    environment: Environment,
    env_file: EnvFileSource,
}

impl ConfigSources {
    /// Explicit input plus a snapshot of the process environment and the
    /// default env file.
    pub fn new(explicit: LlmConfigInput) -> Self {
        Self {
            explicit,
            environment: Environment::from_process(),
            env_file: EnvFileSource::Default,
        }
    }

    /// Explicit input given as a key-value map.
    pub fn from_map<I, K, V>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::new(LlmConfigInput::from_map(map))
    }

    /// No explicit input: everything comes from the environment and file.
    pub fn from_env() -> Self {
        Self::new(LlmConfigInput::new())
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = EnvFileSource::Path(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.env_file = EnvFileSource::Disabled;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// The env file that will be read, if any.
    pub fn env_file_path(&self) -> Option<PathBuf> {
        match &self.env_file {
            EnvFileSource::Default => Some(self.environment.env_file_path(None)),
            EnvFileSource::Path(path) => Some(path.clone()),
            EnvFileSource::Disabled => None,
        }
    }

    /// Merge explicit > environment namespace > file.
    pub fn merged(&self) -> AppResult<RawInput> {
        let file = match self.env_file_path() {
            Some(path) => load_env_file(&path)?.unwrap_or_default(),
            None => RawInput::new(),
        };

        Ok(self
            .explicit
            .as_raw()
            .clone()
            .with_fallback(self.environment.namespace())
            .with_fallback(file))
    }
}

/// The resolved, validated LLM configuration.
///
/// Fields are private; a record can only be obtained through resolution
/// and is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmConfig {
    provider: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: u32,
    api_key: SecretString,
    base_url: Option<Url>,
}

impl LlmConfig {
    /// Resolve explicit input against the process environment and the
    /// default env file.
    ///
    /// # Example
    /// ```no_run
    /// use biominer_core::{LlmConfig, LlmConfigInput};
    ///
    /// let config = LlmConfig::new(LlmConfigInput::new().provider("openai"))
    ///     .expect("OPENAI_API_KEY must be set");
    /// println!("{}", config.model());
    /// ```
    pub fn new(input: LlmConfigInput) -> AppResult<Self> {
        Self::resolve(&ConfigSources::new(input))
    }

    /// Resolve with no explicit arguments.
    pub fn from_env() -> AppResult<Self> {
        Self::resolve(&ConfigSources::from_env())
    }

    /// Resolve explicit arguments given as a key-value map.
    pub fn from_map<I, K, V>(map: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::resolve(&ConfigSources::from_map(map))
    }

    /// Resolve from fully specified sources.
    pub fn resolve(sources: &ConfigSources) -> AppResult<Self> {
        let merged = sources.merged()?;
        Self::from_merged(merged, sources.environment())
    }

    fn from_merged(merged: RawInput, environment: &Environment) -> AppResult<Self> {
        let base_url = merged.get_non_empty("base_url").map(str::trim);
        let provider = resolve_provider(merged.get_non_empty("provider"), base_url.is_some())?;

        let model = merged.get("model").unwrap_or(DEFAULT_MODEL).trim();
        if model.is_empty() {
            return Err(AppError::InvalidField {
                field: "model",
                message: "must not be empty".to_string(),
            });
        }
        let temperature = parse_temperature(merged.get("temperature"))?;
        let max_tokens = parse_max_tokens(merged.get("max_tokens"))?;
        let base_url = base_url.map(parse_base_url).transpose()?;

        let api_key = resolve_api_key(&merged, &provider, environment)?;

        let dropped = dropped_keys(&merged);
        if !dropped.is_empty() {
            tracing::debug!("Dropping unknown config keys: {}", dropped.join(", "));
        }

        let config = Self {
            provider,
            model: model.to_string(),
            temperature,
            max_tokens,
            api_key,
            base_url,
        };

        tracing::debug!(
            provider = %config.provider,
            model = %config.model,
            custom_endpoint = config.base_url.is_some(),
            "Resolved LLM configuration"
        );

        Ok(config)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The provider as a known variant, or `None` for custom endpoints.
    pub fn known_provider(&self) -> Option<KnownProvider> {
        KnownProvider::parse(&self.provider)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Field map with the api key redacted.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        let mut map = BTreeMap::new();
        map.insert("provider".to_string(), self.provider.clone().into());
        map.insert("model".to_string(), self.model.clone().into());
        map.insert(
            "temperature".to_string(),
            self.temperature
                .map(|t| {
                    let widened = t.to_string().parse().unwrap_or_else(|_| f64::from(t));
                    serde_json::Value::from(widened)
                })
                .unwrap_or(serde_json::Value::Null),
        );
        map.insert("max_tokens".to_string(), self.max_tokens.into());
        map.insert("api_key".to_string(), self.api_key.to_string().into());
        map.insert(
            "base_url".to_string(),
            self.base_url
                .as_ref()
                .map(|u| serde_json::Value::from(u.as_str()))
                .unwrap_or(serde_json::Value::Null),
        );
        map
    }
}

/// Merged keys that are neither record fields nor `{provider}_api_key`
/// fallbacks.
fn dropped_keys(merged: &RawInput) -> Vec<&str> {
    merged
        .keys()
        .filter(|key| !RECORD_FIELDS.iter().any(|field| field == key))
        .filter(|key| !key.ends_with("_api_key"))
        .collect()
}

fn resolve_provider(provider: Option<&str>, has_base_url: bool) -> AppResult<String> {
    let provider = provider.map(str::trim);

    if has_base_url {
        return Ok(match provider {
            Some(name) if KnownProvider::parse(name).is_none() => name.to_string(),
            other => {
                tracing::warn!(
                    "base_url is set, using provider '{}' instead of '{}'",
                    CUSTOM_PROVIDER,
                    other.unwrap_or("")
                );
                CUSTOM_PROVIDER.to_string()
            }
        });
    }

    let name = provider.unwrap_or(DEFAULT_PROVIDER);
    KnownProvider::parse(name)
        .map(|known| known.as_str().to_string())
        .ok_or_else(|| AppError::UnsupportedProvider(name.to_string()))
}

/// `api_key` > `{provider}_api_key` input key > `{PROVIDER}_API_KEY` env var.
fn resolve_api_key(
    merged: &RawInput,
    provider: &str,
    environment: &Environment,
) -> AppResult<SecretString> {
    if let Some(key) = merged.get_non_empty("api_key") {
        return Ok(SecretString::new(key));
    }

    if let Some(known) = KnownProvider::parse(provider) {
        if let Some(key) = merged.get_non_empty(&known.api_key_input_key()) {
            tracing::debug!("Using {} from configuration input", known.api_key_input_key());
            return Ok(SecretString::new(key));
        }

        let env_var = known.api_key_env_var();
        if let Some(key) = environment.get(&env_var).filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using api key from environment variable {}", env_var);
            return Ok(SecretString::new(key));
        }
    }

    Err(AppError::MissingApiKey {
        provider: provider.to_string(),
    })
}

fn parse_temperature(raw: Option<&str>) -> AppResult<Option<f32>> {
    let raw = match raw {
        None => return Ok(Some(DEFAULT_TEMPERATURE)),
        Some(raw) if raw.trim().is_empty() => return Ok(None),
        Some(raw) => raw.trim(),
    };

    let temperature: f32 = raw.parse().map_err(|_| AppError::InvalidField {
        field: "temperature",
        message: format!("'{}' is not a number", raw),
    })?;

    if !(0.0..=1.0).contains(&temperature) {
        return Err(AppError::FieldRange {
            field: "temperature",
            message: format!("{} is not within [0.0, 1.0]", temperature),
        });
    }

    Ok(Some(temperature))
}

fn parse_max_tokens(raw: Option<&str>) -> AppResult<u32> {
    let raw = match raw {
        None => return Ok(DEFAULT_MAX_TOKENS),
        Some(raw) => raw.trim(),
    };

    let max_tokens: i64 = raw.parse().map_err(|_| AppError::InvalidField {
        field: "max_tokens",
        message: format!("'{}' is not an integer", raw),
    })?;

    if max_tokens <= 0 {
        return Err(AppError::FieldRange {
            field: "max_tokens",
            message: format!("{} must be greater than 0", max_tokens),
        });
    }

    u32::try_from(max_tokens).map_err(|_| AppError::FieldRange {
        field: "max_tokens",
        message: format!("{} exceeds {}", max_tokens, u32::MAX),
    })
}

fn parse_base_url(raw: &str) -> AppResult<Url> {
    Url::parse(raw).map_err(|e| AppError::InvalidField {
        field: "base_url",
        message: format!("'{}' is not a valid URL: {}", raw, e),
    })
}
