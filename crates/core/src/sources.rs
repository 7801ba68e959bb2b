//! Raw configuration sources.
//!
//! Every source is reduced to a [`RawInput`]: a map of lowercase keys to
//! string values. Layering is explicit, via [`RawInput::with_fallback`],
//! and the process environment is captured once in an [`Environment`]
//! snapshot instead of being read ad hoc.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Prefix of the environment variable namespace, e.g. `BIOMINER_AI_LLM_MODEL`.
pub const ENV_PREFIX: &str = "BIOMINER_AI_LLM_";

/// Nesting delimiter inside namespaced variable names.
pub const ENV_NESTED_DELIMITER: &str = "__";

/// Environment variable that overrides the env file path.
pub const ENV_FILE_VAR: &str = "BIOMINER_AI_ENV";

pub const DEFAULT_ENV_FILE: &str = ".env";

const API_KEY_SUFFIX: &str = "_api_key";

/// Key-value input with lowercase keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawInput(BTreeMap<String, String>);

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Keys are stored lowercase.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(key.as_ref().to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Like [`RawInput::get`], treating blank values as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layer `lower` underneath `self`: keys already present in `self` win.
    /// A blank value never shadows a non-blank one from a lower layer.
    pub fn with_fallback(mut self, lower: RawInput) -> Self {
        for (key, value) in lower.0 {
            match self.0.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => {
                    if slot.get().trim().is_empty() && !value.trim().is_empty() {
                        slot.insert(value);
                    }
                }
            }
        }
        self
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut input = RawInput::new();
        for (key, value) in iter {
            input.insert(key, value);
        }
        input
    }
}

// Values of `*api_key` entries never reach Debug output.
impl fmt::Debug for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if key.ends_with("api_key") {
                map.entry(key, &"**********");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Immutable snapshot of environment variables.
#[derive(Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment. Variables that are not
    /// valid unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Collect the `BIOMINER_AI_LLM_*` namespace.
    ///
    /// `BIOMINER_AI_LLM_MAX_TOKENS` becomes `max_tokens`, and
    /// `BIOMINER_AI_LLM_EXTRA__TOP_P` becomes `extra.top_p`. When one
    /// field is set under several casings, the all-uppercase name wins.
    pub fn namespace(&self) -> RawInput {
        let mut input = RawInput::new();
        for (key, value) in &self.vars {
            let Some(field) = namespaced_key(key) else {
                continue;
            };
            let uppercase = *key == key.to_ascii_uppercase();
            if uppercase || !input.contains_key(&field) {
                input.insert(field, value.clone());
            }
        }
        input
    }

    /// Path of the env file: `explicit`, then `$BIOMINER_AI_ENV`, then `.env`.
    pub fn env_file_path(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => self
                .get(ENV_FILE_VAR)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE)),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("vars", &self.vars.len())
            .finish()
    }
}

/// Strip the namespace prefix (case insensitive) and map nesting to dots.
fn namespaced_key(key: &str) -> Option<String> {
    let upper = key.to_ascii_uppercase();
    let rest = upper.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase().replace(ENV_NESTED_DELIMITER, "."))
}

/// Load a `.env`-style file.
///
/// Namespaced entries map like [`Environment::namespace`]. Un-prefixed
/// `{PROVIDER}_API_KEY` entries are kept as `{provider}_api_key`; all other
/// entries are ignored. A missing file yields `Ok(None)`.
pub fn load_env_file(path: &Path) -> AppResult<Option<RawInput>> {
    if !path.exists() {
        tracing::debug!("Env file {:?} not found, skipping", path);
        return Ok(None);
    }

    let entries = dotenvy::from_path_iter(path)
        .map_err(|e| AppError::Config(format!("Failed to read env file {:?}: {}", path, e)))?;

    let mut input = RawInput::new();
    for entry in entries {
        let (key, value) = entry.map_err(|e| {
            AppError::Config(format!("Failed to parse env file {:?}: {}", path, e))
        })?;

        if let Some(field) = namespaced_key(&key) {
            input.insert(field, value);
        } else {
            let lower = key.to_ascii_lowercase();
            if lower.ends_with(API_KEY_SUFFIX) {
                input.insert(lower, value);
            }
        }
    }

    tracing::debug!("Loaded {} entries from env file {:?}", input.len(), path);
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_namespace_strips_prefix_and_nests() {
        let env = Environment::from_pairs([
            ("BIOMINER_AI_LLM_MODEL", "gpt-4o-mini"),
            ("biominer_ai_llm_provider", "anthropic"),
            ("BIOMINER_AI_LLM_EXTRA__TOP_P", "0.9"),
            ("BIOMINER_AI_LLM_", "ignored"),
            ("OPENAI_API_KEY", "not-namespaced"),
        ]);

        let input = env.namespace();
        assert_eq!(input.get("model"), Some("gpt-4o-mini"));
        assert_eq!(input.get("provider"), Some("anthropic"));
        assert_eq!(input.get("extra.top_p"), Some("0.9"));
        assert_eq!(input.len(), 3);
    }

    #[test]
    fn test_with_fallback_keeps_upper_layer() {
        let upper: RawInput = [("model", "explicit")].into_iter().collect();
        let lower: RawInput = [("model", "env"), ("provider", "xai")].into_iter().collect();

        let merged = upper.with_fallback(lower);
        assert_eq!(merged.get("model"), Some("explicit"));
        assert_eq!(merged.get("provider"), Some("xai"));
    }

    #[test]
    fn test_with_fallback_skips_blank_upper_values() {
        let upper: RawInput = [("api_key", ""), ("model", "  "), ("provider", "anthropic")]
            .into_iter()
            .collect();
        let lower: RawInput = [("api_key", "real"), ("model", ""), ("provider", "xai")]
            .into_iter()
            .collect();

        let merged = upper.with_fallback(lower);
        assert_eq!(merged.get("api_key"), Some("real"));
        assert_eq!(merged.get("model"), Some("  "));
        assert_eq!(merged.get("provider"), Some("anthropic"));
    }

    #[test]
    fn test_namespace_prefers_uppercase_name() {
        for pairs in [
            [
                ("biominer_ai_llm_model", "lower"),
                ("BIOMINER_AI_LLM_MODEL", "upper"),
            ],
            [
                ("BIOMINER_AI_LLM_MODEL", "upper"),
                ("Biominer_Ai_Llm_Model", "mixed"),
            ],
        ] {
            let input = Environment::from_pairs(pairs).namespace();
            assert_eq!(input.get("model"), Some("upper"));
            assert_eq!(input.len(), 1);
        }
    }

    #[test]
    fn test_keys_are_lowercased() {
        let input: RawInput = [("OpenAI_API_KEY", "k")].into_iter().collect();
        assert_eq!(input.get("openai_api_key"), Some("k"));
        assert!(input.get_non_empty("missing").is_none());
    }

    #[test]
    fn test_debug_redacts_api_keys() {
        let input: RawInput = [("api_key", "sk-secret"), ("gemini_api_key", "g-secret")]
            .into_iter()
            .collect();
        let debug = format!("{:?}", input);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("g-secret"));
    }

    #[test]
    fn test_env_file_path_resolution() {
        let env = Environment::from_pairs([(ENV_FILE_VAR, "custom.env")]);
        assert_eq!(env.env_file_path(None), PathBuf::from("custom.env"));
        assert_eq!(
            env.env_file_path(Some(Path::new("explicit.env"))),
            PathBuf::from("explicit.env")
        );
        assert_eq!(
            Environment::default().env_file_path(None),
            PathBuf::from(DEFAULT_ENV_FILE)
        );
    }

    #[test]
    fn test_load_env_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");
        fs::write(
            &path,
            "BIOMINER_AI_LLM_MODEL=gpt-4o\nBIOMINER_AI_LLM_TEMPERATURE=0.8\nOPENAI_API_KEY=file-key\nUNRELATED=1\n",
        )
        .unwrap();

        let input = load_env_file(&path).unwrap().unwrap();
        assert_eq!(input.get("model"), Some("gpt-4o"));
        assert_eq!(input.get("temperature"), Some("0.8"));
        assert_eq!(input.get("openai_api_key"), Some("file-key"));
        assert!(!input.contains_key("unrelated"));
    }

    #[test]
    fn test_load_missing_env_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_env_file(&temp_dir.path().join("absent.env")).unwrap();
        assert!(result.is_none());
    }
}
