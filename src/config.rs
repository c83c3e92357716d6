//! Client configuration and environment loading.

use crate::errors::ConfigError;
use std::time::Duration;

/// Base URL used when `AGRIGPT_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Total request timeout used when none is configured.
///
/// Image diagnosis on the backend can take tens of seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const BASE_URL_ENV: &str = "AGRIGPT_API_URL";
pub const TIMEOUT_MS_ENV: &str = "AGRIGPT_TIMEOUT_MS";
pub const MODE_ENV: &str = "AGRIGPT_MODE";

/// Whether the client runs with development instrumentation.
///
/// In [`BuildMode::Development`] the gateway logs every outgoing method and
/// path, and every normalized error, at `debug`/`warn` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Development for debug builds, production for release builds.
    #[must_use]
    pub const fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" | "release" => Some(Self::Production),
            "development" | "dev" | "debug" => Some(Self::Development),
            _ => None,
        }
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Explicit configuration for an [`AgriClient`](crate::AgriClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root URL of the backend, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Total time allowed for one request, from connect to last body byte
    pub timeout: Duration,
    /// Time allowed for establishing the connection, if limited separately
    pub connect_timeout: Option<Duration>,
    pub mode: BuildMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            mode: BuildMode::default(),
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `AGRIGPT_API_URL`, `AGRIGPT_TIMEOUT_MS` and
    /// `AGRIGPT_MODE`, falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] if `AGRIGPT_TIMEOUT_MS` is set
    /// but is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_MS_ENV) {
            config.timeout = parse_timeout_ms(&raw)?;
        }

        if let Some(raw) = lookup(MODE_ENV) {
            match BuildMode::parse(&raw) {
                Some(mode) => config.mode = mode,
                None => tracing::warn!("Ignoring unrecognized {MODE_ENV} value: {raw:?}"),
            }
        }

        Ok(config)
    }

    /// Checks the base URL and returns it without a trailing slash.
    pub(crate) fn normalized_base_url(&self) -> Result<String, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(trimmed.to_string())
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidTimeout(format!(
            "{TIMEOUT_MS_ENV} must be greater than zero"
        ))),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(ConfigError::InvalidTimeout(format!(
            "{TIMEOUT_MS_ENV}={raw:?}: {e}"
        ))),
    }
}
