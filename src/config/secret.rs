//! Secure credential handling using the secrecy crate
//!
//! Connection strings and linkage passwords live in memory as
//! `Secret<SecretValue>`: zeroed on drop, redacted in Debug output, and
//! only readable through an explicit `expose_secret()` call.

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the secret value by a delimiter
    ///
    /// Used to redact connection strings for display without cloning the
    /// full secret.
    pub fn split(&self, delimiter: char) -> std::str::Split<'_, char> {
        self.0.split(delimiter)
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
///
/// Zeros the memory when dropped, prevents accidental logging via Debug,
/// and requires explicit `expose_secret()` to access.
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("postgresql://user:pw@localhost/a".to_string());
        assert_eq!(
            secret.expose_secret().as_ref(),
            "postgresql://user:pw@localhost/a"
        );
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-data".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("sensitive-data"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_secret_serde() {
        #[derive(Serialize, Deserialize)]
        struct TestConfig {
            connection_string: SecretString,
        }

        let config = TestConfig {
            connection_string: secret_string("test123".to_string()),
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("test123"));

        let deserialized: TestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.connection_string.expose_secret().as_ref(), "test123");
    }

    #[test]
    fn test_secret_split_for_redaction() {
        let secret = secret_string("postgresql://u:p@db-host:5432/shop".to_string());
        let tail = secret.expose_secret().split('@').next_back().unwrap();
        assert_eq!(tail, "db-host:5432/shop");
    }
}
