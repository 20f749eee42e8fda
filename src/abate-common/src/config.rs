//! Console configuration.
//!
//! Loaded from `<app home>/config.toml` (a missing file means defaults),
//! then overridden by environment variables:
//!
//! - `ABATE_ENV`: `development` or `production`, picks the default backend
//! - `ABATE_API_URL`: explicit backend base URL
//! - `ABATE_EXPORT_DIR`: where exported artifacts are written

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend base URL used by the development profile.
pub const DEVELOPMENT_API_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Backend base URL used by the production profile.
pub const PRODUCTION_API_URL: &str = "https://abatedouro-jkax.onrender.com/api/v1";

pub const ENV_VAR_ENVIRONMENT: &str = "ABATE_ENV";
pub const ENV_VAR_API_URL: &str = "ABATE_API_URL";
pub const ENV_VAR_EXPORT_DIR: &str = "ABATE_EXPORT_DIR";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown environment '{0}' (expected development or production)")]
    UnknownEnvironment(String),
}

/// Deployment profile the console talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local backend.
    #[default]
    Development,
    /// Hosted backend.
    Production,
}

impl Environment {
    /// Backend base URL of this profile.
    pub fn default_api_base_url(self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_API_URL,
            Environment::Production => PRODUCTION_API_URL,
        }
    }

    /// Parse the names people actually type, including the old menu numbers.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "dev" | "development" | "local" => Some(Environment::Development),
            "2" | "prod" | "production" | "render" => Some(Environment::Production),
            _ => None,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Bounded waits used by the navigation guard.
///
/// Each ceiling is expressed as `poll_interval_ms * attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardTimings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_init_attempts")]
    pub init_attempts: u32,
    #[serde(default = "default_loading_attempts")]
    pub loading_attempts: u32,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_init_attempts() -> u32 {
    50
}

fn default_loading_attempts() -> u32 {
    30
}

impl Default for GuardTimings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            init_attempts: default_init_attempts(),
            loading_attempts: default_loading_attempts(),
        }
    }
}

impl GuardTimings {
    /// Longest wait for an in-flight identity bootstrap (5s by default).
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).saturating_mul(self.init_attempts)
    }

    /// Longest wait for an in-flight login/logout (3s by default).
    pub fn loading_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).saturating_mul(self.loading_attempts)
    }
}

/// Export delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Directory for CSV files and print previews; defaults to `<app home>/exports`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Pause between the print surface finishing loading and printing.
    #[serde(default = "default_settle_delay_ms")]
    pub print_settle_delay_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    250
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir: None,
            print_settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl ExportSettings {
    pub fn print_settle_delay(&self) -> Duration {
        Duration::from_millis(self.print_settle_delay_ms)
    }
}

/// Top-level console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Deployment profile.
    #[serde(default)]
    pub environment: Environment,

    /// Explicit backend URL; wins over the profile default.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Request timeout in seconds; 0 means the client default.
    #[serde(default)]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub guard: GuardTimings,

    #[serde(default)]
    pub export: ExportSettings,
}

impl ConsoleConfig {
    /// Load configuration from a TOML file; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(env) = lookup(ENV_VAR_ENVIRONMENT).filter(|v| !v.trim().is_empty()) {
            self.environment = Environment::from_str_loose(&env)
                .ok_or_else(|| ConfigError::UnknownEnvironment(env.clone()))?;
        }
        if let Some(url) = lookup(ENV_VAR_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(dir) = lookup(ENV_VAR_EXPORT_DIR).filter(|v| !v.trim().is_empty()) {
            self.export.dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Effective backend base URL, without a trailing slash.
    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.default_api_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Effective request timeout.
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs == 0 {
            crate::http_client::DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }
}
