//! Opaque secret strings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const REDACTED: &str = "**********";

/// A string whose content is withheld from `Debug`, `Display`, and
/// serialization.
///
/// The only way to read the value is [`SecretString::expose_secret`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain-text secret.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString({})", REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretString)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_hidden_from_formatting() {
        let secret = SecretString::new("sk-live-123");
        assert_eq!(format!("{}", secret), REDACTED);
        assert!(!format!("{:?}", secret).contains("sk-live-123"));
    }

    #[test]
    fn test_secret_is_hidden_from_serialization() {
        let secret = SecretString::new("sk-live-123");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, format!("\"{}\"", REDACTED));
    }

    #[test]
    fn test_expose_secret() {
        let secret: SecretString = serde_json::from_str("\"sk-live-123\"").unwrap();
        assert_eq!(secret.expose_secret(), "sk-live-123");
        assert!(!secret.is_empty());
    }
}
