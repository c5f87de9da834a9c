//! Tool settings
//!
//! Resolution order, later wins:
//! 1. Built-in defaults (two in-memory stores, so the tool runs offline)
//! 2. Optional TOML file
//! 3. `PATHPARITY_*` environment variables
//! 4. Command-line flags

use pathparity_backends::{MemoryBackend, PathStyle, RestBackend, RestConfig};
use pathparity_core::BackendId;
use pathparity_probe::{AdapterError, BackendAdapter, ConsistencyWait};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding the results directory
pub const ENV_RESULTS_DIR: &str = "PATHPARITY_RESULTS_DIR";
/// Environment variable pointing backend A at a REST store
pub const ENV_A_URL: &str = "PATHPARITY_A_URL";
/// Environment variable pointing backend B at a REST store
pub const ENV_B_URL: &str = "PATHPARITY_B_URL";
/// Environment variable carrying the REST auth token
pub const ENV_AUTH_TOKEN: &str = "PATHPARITY_AUTH_TOKEN";
/// Environment variable overriding the inter-scenario delay
pub const ENV_SCENARIO_DELAY_MS: &str = "PATHPARITY_SCENARIO_DELAY_MS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File is not valid settings TOML
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Environment variable holds an unusable value
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// How to reach one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// HTTP store
    Rest {
        /// Store URL
        base_url: String,
        /// Token sent as `?auth=`
        #[serde(default)]
        auth_token: Option<String>,
        /// Per-request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// In-process store
    Memory {
        /// Path resolution style
        #[serde(default)]
        style: PathStyle,
        /// Substrings rejected as invalid paths
        #[serde(default)]
        reject_containing: Vec<String>,
    },
}

impl BackendConfig {
    /// REST backend at `base_url`
    #[must_use]
    pub fn rest(base_url: impl Into<String>) -> Self {
        Self::Rest {
            base_url: base_url.into(),
            auth_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// In-memory backend with `style`
    #[must_use]
    pub fn memory(style: PathStyle) -> Self {
        Self::Memory {
            style,
            reject_containing: Vec::new(),
        }
    }

    /// Construct the adapter
    ///
    /// # Errors
    /// - `AdapterErrorKind::Transport` if the HTTP client cannot be built
    pub fn build(&self) -> Result<Arc<dyn BackendAdapter>, AdapterError> {
        let adapter: Arc<dyn BackendAdapter> = match self {
            Self::Rest {
                base_url,
                auth_token,
                timeout_secs,
            } => {
                let mut config =
                    RestConfig::new(base_url.clone()).with_timeout(Duration::from_secs(*timeout_secs));
                if let Some(token) = auth_token {
                    config = config.with_auth_token(token.clone());
                }
                Arc::new(RestBackend::new(config)?)
            }
            Self::Memory {
                style,
                reject_containing,
            } => Arc::new(
                MemoryBackend::new(*style).with_reject_containing(reject_containing.clone()),
            ),
        };
        Ok(adapter)
    }

    fn set_url(&mut self, url: String) {
        match self {
            Self::Rest { base_url, .. } => *base_url = url,
            Self::Memory { .. } => *self = Self::rest(url),
        }
    }

    fn set_token(&mut self, token: &str) {
        if let Self::Rest { auth_token, .. } = self {
            *auth_token = Some(token.to_string());
        }
    }
}

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where runs, analyses and reports are written
    pub results_dir: PathBuf,
    /// Throttle between consecutive scenarios, in milliseconds
    pub scenario_delay_ms: u64,
    /// Wait between a write and its verification reads
    pub wait: ConsistencyWait,
    /// Backend A
    pub backend_a: BackendConfig,
    /// Backend B
    pub backend_b: BackendConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            scenario_delay_ms: 200,
            wait: ConsistencyWait::default(),
            backend_a: BackendConfig::memory(PathStyle::Literal),
            backend_b: BackendConfig::memory(PathStyle::Normalizing),
        }
    }
}

impl Settings {
    /// Defaults, then `path` if given, then the process environment
    ///
    /// # Errors
    /// Any [`ConfigError`] from the file or the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse a TOML settings file
    ///
    /// # Errors
    /// - `ConfigError::Read` / `ConfigError::Parse`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `PATHPARITY_*` overrides read through `get`
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` for a non-numeric delay
    pub fn apply_env_from(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = get(ENV_RESULTS_DIR) {
            self.results_dir = PathBuf::from(dir);
        }
        if let Some(url) = get(ENV_A_URL) {
            self.backend_a.set_url(url);
        }
        if let Some(url) = get(ENV_B_URL) {
            self.backend_b.set_url(url);
        }
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            self.backend_a.set_token(&token);
            self.backend_b.set_token(&token);
        }
        if let Some(delay) = get(ENV_SCENARIO_DELAY_MS) {
            self.scenario_delay_ms = delay.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_SCENARIO_DELAY_MS,
                value: delay.clone(),
            })?;
        }
        Ok(())
    }

    /// Set the results directory
    #[inline]
    #[must_use]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Set the inter-scenario delay
    #[inline]
    #[must_use]
    pub fn with_scenario_delay_ms(mut self, millis: u64) -> Self {
        self.scenario_delay_ms = millis;
        self
    }

    /// Set the consistency wait policy
    #[inline]
    #[must_use]
    pub fn with_wait(mut self, wait: ConsistencyWait) -> Self {
        self.wait = wait;
        self
    }

    /// Replace one backend's configuration
    #[must_use]
    pub fn with_backend(mut self, backend: BackendId, config: BackendConfig) -> Self {
        match backend {
            BackendId::A => self.backend_a = config,
            BackendId::B => self.backend_b = config,
        }
        self
    }

    /// Configuration for one backend
    #[inline]
    #[must_use]
    pub fn backend(&self, backend: BackendId) -> &BackendConfig {
        match backend {
            BackendId::A => &self.backend_a,
            BackendId::B => &self.backend_b,
        }
    }

    /// Inter-scenario delay
    #[inline]
    #[must_use]
    pub fn scenario_delay(&self) -> Duration {
        Duration::from_millis(self.scenario_delay_ms)
    }
}
