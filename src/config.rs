//! Configuration file parser for alcove.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! The API key may live in the file or in the `ALCOVE_API_KEY` environment
//! variable; the environment wins so deployments can keep the secret out of
//! the file entirely.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. The custom `Debug` impl masks `api_key` so the shared secret
/// never lands in logs or error output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen: String,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// Shared secret for the `x-auth-key` header (alternative to the
    /// ALCOVE_API_KEY env var; the env var takes precedence).
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            database_path: "alcove.db".to_string(),
            api_key: None,
        }
    }
}

/// Mask api_key in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("database_path", &self.database_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), listen = %config.listen, "Loaded configuration");
        Ok(config)
    }

    /// Resolve the shared secret: `ALCOVE_API_KEY` env var first, config
    /// file second. `None` means the server cannot authenticate anyone and
    /// should refuse to start.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        std::env::var("ALCOVE_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.api_key.clone())
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen, "0.0.0.0:8000");
        assert_eq!(config.database_path, "alcove.db");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/alcove_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8000");
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("alcove_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("alcove.toml");
        std::fs::write(&path, "listen = \"127.0.0.1:9999\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9999");
        assert_eq!(config.database_path, "alcove.db"); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("alcove_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("alcove.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(
            !debug_output.contains("super-secret-key-12345"),
            "Debug output should not contain the API key"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_file_key_used_when_env_absent() {
        let config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        // Serial-safe: the env var is not set in the test environment.
        if std::env::var("ALCOVE_API_KEY").is_err() {
            use secrecy::ExposeSecret;
            let key = config.resolve_api_key().unwrap();
            assert_eq!(key.expose_secret(), "from-file");
        }
    }
}
