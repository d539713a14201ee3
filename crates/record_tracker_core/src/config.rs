//! Tracker configuration.
//!
//! # Responsibility
//! - Load store and logging settings from a TOML file.
//! - Apply environment overrides for the store endpoint.
//!
//! # Invariants
//! - Every field has a default; an empty file is a valid configuration.
//! - `validate()` runs before a configuration is returned from `load`.

use crate::logging::default_log_level;
use crate::store::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default realtime database endpoint.
pub const DEFAULT_DATABASE_URL: &str = "https://record-mine-default-rtdb.firebaseio.com/";
/// Environment variable overriding `store.url`.
pub const DATABASE_URL_ENV: &str = "RECORD_TRACKER_DATABASE_URL";
/// Default request timeout for the http backend.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default database file for the sqlite backend.
pub const DEFAULT_SQLITE_FILE: &str = "record_tracker.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Document backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Remote realtime JSON database over REST.
    #[default]
    Http,
    /// Local SQLite file.
    Sqlite,
    /// Process memory; nothing survives exit.
    Memory,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
    pub sqlite_path: PathBuf,
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: DEFAULT_DATABASE_URL.to_string(),
            auth_token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_FILE),
            retry: RetryPolicy::default(),
        }
    }
}

/// `[logging]` section. File logging starts only when `dir` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` when given, otherwise defaults; then applies environment
    /// overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.store.url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Http && self.store.url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.url must be set for the http backend".to_string(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.store.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "store.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Sqlite
            && self.store.sqlite_path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "store.sqlite_path must be set for the sqlite backend".to_string(),
            ));
        }
        Ok(())
    }
}
