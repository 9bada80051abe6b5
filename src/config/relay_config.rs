//! Relay Configuration - endpoint and delivery settings as TOML values
//!
//! Each struct implements `Default` with the values in [`super::defaults`],
//! so an empty or missing file behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the relay and the query tool.
///
/// Load with `RelayConfig::load()` which searches:
/// 1. `$FACT_RELAY_CONFIG` env var
/// 2. `./fact_relay.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Remote service URLs and credentials
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Queue and request tuning
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl RelayConfig {
    /// Load configuration using the standard search order, then apply the
    /// `FACT_RELAY_TOKEN` override.
    pub fn load() -> Self {
        let mut config = Self::load_without_env();
        config.apply_token_override(std::env::var(defaults::TOKEN_ENV).ok());
        if config.endpoint.token.is_empty() {
            warn!(
                "No bearer token configured, set {} or [endpoint].token",
                defaults::TOKEN_ENV
            );
        }
        config
    }

    /// Load from `path` when given (errors are returned, not swallowed),
    /// otherwise fall back to [`load`](Self::load). The token override
    /// applies either way.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::load());
        };
        let mut config = Self::load_from_file(path)?;
        config.apply_token_override(std::env::var(defaults::TOKEN_ENV).ok());
        info!(path = %path.display(), "Loaded relay config");
        Ok(config)
    }

    fn load_without_env() -> Self {
        let from_env = std::env::var_os(defaults::CONFIG_PATH_ENV).map(PathBuf::from);
        Self::search(from_env.as_deref(), Path::new(defaults::LOCAL_CONFIG_FILE))
    }

    /// First usable file among `from_env` and `local`, else defaults.
    ///
    /// A candidate that is missing or fails to load is logged and skipped.
    fn search(from_env: Option<&Path>, local: &Path) -> Self {
        let candidates = from_env
            .map(|p| (p, defaults::CONFIG_PATH_ENV))
            .into_iter()
            .chain([(local, "working directory")]);

        for (path, source) in candidates {
            if !path.exists() {
                if source == defaults::CONFIG_PATH_ENV {
                    warn!(path = %path.display(), "{source} points to a missing file, skipping");
                }
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => {
                    info!(path = %path.display(), source, "Loaded relay config");
                    return config;
                }
                Err(e) => warn!(path = %path.display(), source, error = %e, "Ignoring unusable config"),
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the configured token when an override is present and non-empty.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.endpoint.token = token.trim().to_string();
        }
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all settings, collecting every problem rather than stopping
    /// at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_url(&self.endpoint.save_fact_url, "endpoint.save_fact_url", &mut errors);
        Self::check_url(&self.endpoint.get_facts_url, "endpoint.get_facts_url", &mut errors);

        if self.delivery.queue_capacity == 0 {
            errors.push("delivery.queue_capacity must be at least 1".to_string());
        }
        if self.delivery.request_timeout_secs == 0 {
            errors.push("delivery.request_timeout_secs must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_url(raw: &str, name: &str, errors: &mut Vec<String>) {
        match reqwest::Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "{name}: unsupported scheme '{}' (expected http or https)",
                url.scheme()
            )),
            Err(e) => errors.push(format!("{name}: invalid URL '{raw}': {e}")),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Cannot parse config {}: {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Endpoint Config
// ============================================================================

/// Remote service location and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL facts are POSTed to, one per request.
    #[serde(default = "default_save_fact_url")]
    pub save_fact_url: String,

    /// URL used by the read-path query tool.
    #[serde(default = "default_get_facts_url")]
    pub get_facts_url: String,

    /// Bearer token sent in the `Authorization` header.
    ///
    /// Can be overridden by the `FACT_RELAY_TOKEN` env var.
    #[serde(default)]
    pub token: String,
}

fn default_save_fact_url() -> String {
    defaults::SAVE_FACT_URL.to_string()
}

fn default_get_facts_url() -> String {
    defaults::GET_FACTS_URL.to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            save_fact_url: default_save_fact_url(),
            get_facts_url: default_get_facts_url(),
            token: String::new(),
        }
    }
}

// ============================================================================
// Delivery Config
// ============================================================================

/// Queue sizing and per-request timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum facts waiting for the worker before `enqueue` suspends.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Wall-clock timeout for a single HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_queue_capacity() -> usize { defaults::QUEUE_CAPACITY }
fn default_request_timeout_secs() -> u64 { defaults::REQUEST_TIMEOUT_SECS }

impl DeliveryConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: RelayConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.endpoint.save_fact_url, defaults::SAVE_FACT_URL);
        assert_eq!(config.endpoint.get_facts_url, defaults::GET_FACTS_URL);
        assert!(config.endpoint.token.is_empty());
        assert_eq!(config.delivery.queue_capacity, 1000);
        assert_eq!(config.delivery.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[endpoint]
token = "abc123"

[delivery]
queue_capacity = 16
"#;
        let config: RelayConfig = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.endpoint.token, "abc123");
        assert_eq!(config.delivery.queue_capacity, 16);
        // Non-overridden values retain defaults
        assert_eq!(config.endpoint.save_fact_url, defaults::SAVE_FACT_URL);
        assert_eq!(config.delivery.request_timeout_secs, 30);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.delivery.queue_capacity = 0;
        config.delivery.request_timeout_secs = 0;
        config.endpoint.save_fact_url = "not a url".to_string();
        config.endpoint.get_facts_url = "ftp://example.com/facts".to_string();

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 4, "unexpected errors: {errors:?}");
                assert!(errors.iter().any(|e| e.contains("queue_capacity")));
                assert!(errors.iter().any(|e| e.contains("request_timeout_secs")));
                assert!(errors.iter().any(|e| e.contains("save_fact_url")));
                assert!(errors.iter().any(|e| e.contains("unsupported scheme 'ftp'")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_token_override() {
        let mut config = RelayConfig::default();
        config.endpoint.token = "from-file".to_string();

        config.apply_token_override(None);
        assert_eq!(config.endpoint.token, "from-file");

        config.apply_token_override(Some("   ".to_string()));
        assert_eq!(config.endpoint.token, "from-file");

        config.apply_token_override(Some(" from-env\n".to_string()));
        assert_eq!(config.endpoint.token, "from-env");
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fact_relay.toml");
        std::fs::write(
            &path,
            "[endpoint]\nsave_fact_url = \"http://127.0.0.1:9000/save\"\n\n[delivery]\nrequest_timeout_secs = 5\n",
        )
        .unwrap();

        let config = RelayConfig::load_from_file(&path).unwrap();
        assert_eq!(config.endpoint.save_fact_url, "http://127.0.0.1:9000/save");
        assert_eq!(config.delivery.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fact_relay.toml");
        std::fs::write(&path, "[delivery]\nqueue_capacity = 0\n").unwrap();

        let result = RelayConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = RelayConfig::load_from_file(&tmp.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }

    #[test]
    fn test_search_order() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join("from_env.toml");
        let local_file = tmp.path().join("fact_relay.toml");
        std::fs::write(&env_file, "[delivery]\nqueue_capacity = 7\n").unwrap();
        std::fs::write(&local_file, "[delivery]\nqueue_capacity = 9\n").unwrap();

        let config = RelayConfig::search(Some(&env_file), &local_file);
        assert_eq!(config.delivery.queue_capacity, 7);

        // Missing env file falls through to the local one.
        let config = RelayConfig::search(Some(&tmp.path().join("absent.toml")), &local_file);
        assert_eq!(config.delivery.queue_capacity, 9);

        // So does an env file that fails validation.
        std::fs::write(&env_file, "[delivery]\nqueue_capacity = 0\n").unwrap();
        let config = RelayConfig::search(Some(&env_file), &local_file);
        assert_eq!(config.delivery.queue_capacity, 9);

        let config = RelayConfig::search(None, &tmp.path().join("absent.toml"));
        assert_eq!(config.delivery.queue_capacity, defaults::QUEUE_CAPACITY);
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let err = ConfigError::Validation(vec!["a is bad".to_string(), "b is bad".to_string()]);
        assert_eq!(err.to_string(), "Invalid config: a is bad; b is bad");
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut original = RelayConfig::default();
        original.delivery.queue_capacity = 42;
        let toml_str = original.to_toml().expect("serialization should work");
        assert!(toml_str.contains("[endpoint]"), "Missing [endpoint] section");
        assert!(toml_str.contains("[delivery]"), "Missing [delivery] section");
        let roundtripped: RelayConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(roundtripped.delivery.queue_capacity, 42);
        assert_eq!(roundtripped.endpoint.save_fact_url, original.endpoint.save_fact_url);
    }
}
