//! Configuration loading for stage-relay.
//!
//! Configuration is loaded from a TOML file (default: `relay.toml`).

use serde::Deserialize;
use stage_core::{PublicKey, SharedKey};
use std::path::PathBuf;

/// Root configuration for stage-relay.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Key material.
    pub keys: KeysConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener (default: 127.0.0.1:7568).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Largest accepted request body in bytes (default: 10 MiB).
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

/// Key configuration.
///
/// Keys are base64 text and are length-checked while parsing, so a config
/// holding a truncated key fails to load.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    /// Key shared with every client, used to seal and open bodies.
    pub shared_key: SharedKey,
    /// Public half of the clients' signing key pair.
    pub sign_public_key: PublicKey,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (default: info).
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_listen_addr() -> String {
    "127.0.0.1:7568".to_string()
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Create a configuration with default server and logging settings.
    pub fn new(shared_key: SharedKey, sign_public_key: PublicKey) -> Self {
        Self {
            server: ServerConfig::default(),
            keys: KeysConfig {
                shared_key,
                sign_public_key,
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.server.max_body_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_body_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The listen address, checked to be `host:port`.
    ///
    /// The host may be a name; it is resolved when the listener binds.
    pub fn listen_addr(&self) -> Result<&str, ConfigError> {
        let addr = self.server.listen_addr.as_str();
        let invalid = |reason: &str| ConfigError::InvalidListenAddr {
            addr: addr.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = addr.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        port.parse::<u16>().map_err(|_| invalid("port is not a number in 0-65535"))?;
        Ok(addr)
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
    /// Listen address is not `host:port`.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidListenAddr {
        /// The configured address.
        addr: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::generate_key_pair;
    use std::io::Write;

    fn keys_toml() -> String {
        let shared = SharedKey::generate().unwrap();
        let (public, _) = generate_key_pair();
        format!(
            "[keys]\nshared_key = \"{}\"\nsign_public_key = \"{}\"\n",
            shared, public
        )
    }

    #[test]
    fn config_from_toml_string() {
        let toml = format!(
            r#"
[server]
listen_addr = "0.0.0.0:9000"
max_body_size = 2048

[logging]
level = "debug"

{}"#,
            keys_toml()
        );

        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.max_body_size, 2048);
        assert_eq!(config.logging.level, "debug");
        config.validate().unwrap();
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: Config = toml::from_str(&keys_toml()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:7568");
        assert_eq!(config.server.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.listen_addr().unwrap(), "127.0.0.1:7568");
    }

    #[test]
    fn config_requires_keys() {
        assert!(toml::from_str::<Config>("[server]\n").is_err());
    }

    #[test]
    fn short_key_fails_to_load() {
        let (public, _) = generate_key_pair();
        let toml = format!(
            "[keys]\nshared_key = \"AAAA\"\nsign_public_key = \"{}\"\n",
            public
        );
        assert!(toml::from_str::<Config>(&toml).is_err());
    }

    #[test]
    fn hostname_listen_addr_is_accepted() {
        let (public, _) = generate_key_pair();
        let mut config = Config::new(SharedKey::generate().unwrap(), public);
        for addr in ["localhost:7568", "0.0.0.0:9000", "[::1]:7568"] {
            config.server.listen_addr = addr.to_string();
            config.validate().unwrap();
            assert_eq!(config.listen_addr().unwrap(), addr);
        }
    }

    #[test]
    fn bad_listen_addr_fails_validation() {
        let (public, _) = generate_key_pair();
        let mut config = Config::new(SharedKey::generate().unwrap(), public);
        for addr in ["localhost", ":7568", "localhost:", "localhost:http", "localhost:70000"] {
            config.server.listen_addr = addr.to_string();
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidListenAddr { .. })),
                "{} should be rejected",
                addr
            );
        }
    }

    #[test]
    fn zero_body_limit_fails_validation() {
        let (public, _) = generate_key_pair();
        let mut config = Config::new(SharedKey::generate().unwrap(), public);
        config.server.max_body_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(keys_toml().as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
