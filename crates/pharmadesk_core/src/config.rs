//! Client configuration.
//!
//! # Responsibility
//! - Load `ClientConfig` from a TOML file with environment overrides.
//! - Validate values before any store or backend is opened.
//!
//! # Invariants
//! - `api_base_url = None` means offline mode: the fallback layer serves
//!   every backend-first operation.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api_base_url`.
pub const ENV_API_URL: &str = "PHARMADESK_API_URL";
/// Environment variable overriding `data_dir`.
pub const ENV_DATA_DIR: &str = "PHARMADESK_DATA_DIR";

const DB_FILE_NAME: &str = "pharmadesk.sqlite3";
const DEFAULT_NEAR_EXPIRY_DAYS: u32 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: Option<String>,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub near_expiry_days: u32,
    pub request_timeout_secs: u64,
    pub storage_quota_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            data_dir: default_data_dir(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            near_expiry_days: DEFAULT_NEAR_EXPIRY_DAYS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
        }
    }
}

impl ClientConfig {
    /// Parses TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given (defaults otherwise), then applies env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_DATA_DIR).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Applies override values; empty strings clear `api_base_url`.
    pub fn apply_overrides(&mut self, api_url: Option<String>, data_dir: Option<String>) {
        if let Some(url) = api_url {
            let trimmed = url.trim();
            self.api_base_url = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let Some(dir) = data_dir.filter(|dir| !dir.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir.trim());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api_base_url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|err| ConfigError::Invalid(format!("api_base_url `{url}`: {err}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "api_base_url must use http or https, got `{}`",
                    parsed.scheme()
                )));
            }
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.storage_quota_bytes == 0 {
            return Err(ConfigError::Invalid(
                "storage_quota_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_offline(&self) -> bool {
        self.api_base_url.is_none()
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("logs"))
    }
}

fn default_data_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::env::temp_dir())
        .join(".pharmadesk")
}
