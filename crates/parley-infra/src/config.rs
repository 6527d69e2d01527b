//! Configuration loading for Parley.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`Config`], falling back to defaults when the file is missing or
//! malformed. The provider API key comes from the environment only and
//! its absence is a fatal startup error, never a runtime one.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;

use parley_types::config::Config;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Placeholder value shipped in example env files; treated as absent.
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY";

/// Errors that abort startup before the server binds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{API_KEY_ENV} is not set; add your Gemini API key to the environment")]
    MissingApiKey,

    #[error("{API_KEY_ENV} still holds the placeholder value; replace it with a real key")]
    PlaceholderApiKey,
}

/// Resolve the data directory: `PARLEY_DATA_DIR`, falling back to
/// `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("PARLEY_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".parley")
        }
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`Config::default()`].
/// - Unreadable or unparsable file: logs a warning, returns the default.
pub async fn load_config(data_dir: &Path) -> Config {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config.toml at {}, using defaults", config_path.display());
            return Config::default();
        }
        Err(err) => {
            tracing::warn!(
                "failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            Config::default()
        }
    }
}

/// Read the provider API key from the environment.
///
/// A missing, empty, or placeholder value is rejected so the process
/// refuses to start rather than failing on the first chat request.
pub fn provider_api_key() -> Result<SecretString, ConfigError> {
    match std::env::var(API_KEY_ENV) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::MissingApiKey),
        Ok(value) if value == API_KEY_PLACEHOLDER => Err(ConfigError::PlaceholderApiKey),
        Ok(value) => Ok(SecretString::from(value)),
        Err(_) => Err(ConfigError::MissingApiKey),
    }
}
