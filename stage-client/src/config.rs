//! Client configuration.

use serde::Deserialize;
use stage_core::{PrivateKey, SharedKey};
use std::path::{Path, PathBuf};

/// Settings needed to talk to a relay.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Relay base URL, e.g. `http://127.0.0.1:7568`.
    pub endpoint: String,
    /// Key shared with the relay.
    pub shared_key: SharedKey,
    /// This client's signing key (64 bytes, base64).
    pub sign_private_key: PrivateKey,
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check that the endpoint is an http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rest = self
            .endpoint
            .strip_prefix("http://")
            .or_else(|| self.endpoint.strip_prefix("https://"));
        match rest {
            Some(host) if !host.trim_end_matches('/').is_empty() => Ok(()),
            _ => Err(ConfigError::InvalidEndpoint(self.endpoint.clone())),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Endpoint is not an http(s) URL.
    #[error("invalid endpoint: {0} (expected http:// or https://)")]
    InvalidEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::generate_key_pair;
    use std::io::Write;

    fn config_toml(endpoint: &str) -> String {
        let (_, private) = generate_key_pair();
        format!(
            "endpoint = \"{}\"\nshared_key = \"{}\"\nsign_private_key = \"{}\"\n",
            endpoint,
            SharedKey::generate().unwrap(),
            private
        )
    }

    #[test]
    fn config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config_toml("http://127.0.0.1:7568").as_bytes())
            .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:7568");
        config.validate().unwrap();
    }

    #[test]
    fn endpoint_must_be_http() {
        for endpoint in ["127.0.0.1:7568", "ftp://relay", "http://", "https:///"] {
            let config: ClientConfig = toml::from_str(&config_toml(endpoint)).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_))),
                "{} accepted",
                endpoint
            );
        }
    }

    #[test]
    fn truncated_private_key_fails_to_parse() {
        let toml = format!(
            "endpoint = \"http://x\"\nshared_key = \"{}\"\nsign_private_key = \"AAAA\"\n",
            SharedKey::generate().unwrap()
        );
        assert!(toml::from_str::<ClientConfig>(&toml).is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ClientConfig::from_file(&dir.path().join("none.toml")),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
