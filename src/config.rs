//! Service configuration.
//!
//! Defaults cover local development. Every field can be overridden from the
//! environment, see [`AppConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default Gemini REST base.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default model for chat and image calls.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
/// Default `SQLite` file.
pub const DEFAULT_DB_PATH: &str = "styling_sessions.db";
/// Path value selecting the in-process store.
pub const IN_MEMORY_DB_PATH: &str = ":memory:";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration for the service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Generative API settings.
    pub gemini: GeminiConfig,
    /// Rate-limit retry settings.
    pub retry: RetryConfig,
    /// Session persistence settings.
    pub storage: StorageConfig,
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port bound on all interfaces.
    pub port: u16,
    /// Directory of static front-end assets.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: "static".to_string(),
        }
    }
}

/// Generative API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. `None` makes every call fail with a configuration error.
    pub api_key: Option<String>,
    /// REST base URL.
    pub api_base: String,
    /// Model for chat turns.
    pub chat_model: String,
    /// Model for image generation.
    pub image_model: String,
    /// Whole-request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            chat_model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Retry settings for rate-limited upstream calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before each retry, in milliseconds. Its length is the retry count.
    pub delays_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: vec![700, 1400],
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            delays_ms: Vec::new(),
        }
    }

    /// Delays as durations.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays_ms.iter().copied().map(Duration::from_millis).collect()
    }
}

/// Session persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` file path, or `:memory:` for the in-process store.
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

impl StorageConfig {
    /// Whether sessions should live only in process memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.sqlite_path == IN_MEMORY_DB_PATH
    }
}

impl AppConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from process environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is present but malformed, or validation fails.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a variable is present but malformed, or validation fails.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = non_empty("STYLING_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidConfig(format!("STYLING_PORT is not a port: {port}")))?;
        }
        if let Some(dir) = non_empty("STYLING_STATIC_DIR") {
            config.server.static_dir = dir;
        }
        config.gemini.api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY"));
        if let Some(base) = non_empty("GEMINI_API_BASE") {
            config.gemini.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty("STYLING_CHAT_MODEL") {
            config.gemini.chat_model = model;
        }
        if let Some(model) = non_empty("STYLING_IMAGE_MODEL") {
            config.gemini.image_model = model;
        }
        if let Some(path) = non_empty("STYLING_DB_PATH") {
            config.storage.sqlite_path = path;
        }
        if let Some(delays) = lookup("STYLING_RETRY_DELAYS_MS") {
            config.retry.delays_ms = parse_delays(&delays)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the listener port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Set the Gemini API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini.api_key = Some(key.into());
        self
    }

    /// Set the `SQLite` path.
    #[must_use]
    pub fn with_sqlite_path(mut self, path: impl Into<String>) -> Self {
        self.storage.sqlite_path = path.into();
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        Url::parse(&self.gemini.api_base)?;

        if self.gemini.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "gemini.chat_model must not be empty".to_string(),
            ));
        }

        if self.gemini.image_model.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "gemini.image_model must not be empty".to_string(),
            ));
        }

        if self.storage.sqlite_path.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "storage.sqlite_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_delays(raw: &str) -> ConfigResult<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>().map_err(|_| {
                ConfigError::InvalidConfig(format!("STYLING_RETRY_DELAYS_MS entry is not a number: {part}"))
            })
        })
        .collect()
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
