use std::{env, net::SocketAddr, num::NonZeroUsize, time::Duration};

use thiserror::Error;

/// Environment variable holding the Gemini credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

#[derive(Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    gemini_api_key: Option<String>,
    gemini_model: String,
    gemini_base_url: String,
    gemini_timeout: Duration,
    sample_cap: NonZeroUsize,
    max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// Loads settings from the process environment.
    ///
    /// The API key is optional here: the server starts without it and reports
    /// the problem when an analysis is requested.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a value is present but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_socket_addr("LOGEASY_HTTP_BIND", "0.0.0.0:8501")?;
        let gemini_api_key = env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let gemini_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let gemini_base_url =
            env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let gemini_timeout = parse_duration_secs("GEMINI_TIMEOUT_SECS", 120)?;
        let sample_cap = parse_non_zero_usize("LOGEASY_SAMPLE_CAP", 100)?;
        let max_upload_bytes = parse_usize("LOGEASY_MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?;

        Ok(Self {
            http_bind,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            gemini_timeout,
            sample_cap,
            max_upload_bytes,
        })
    }

    /// Points the client at another endpoint and replaces the credential.
    #[must_use]
    pub fn with_gemini(mut self, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        self.gemini_base_url = base_url.into();
        self.gemini_api_key = api_key;
        self
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref()
    }

    /// Returns the API key, or [`ConfigError::Missing`] naming `GEMINI_API_KEY`.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] when `GEMINI_API_KEY` is unset or blank.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key().ok_or(ConfigError::Missing(API_KEY_ENV))
    }

    #[must_use]
    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    #[must_use]
    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }

    #[must_use]
    pub fn gemini_timeout(&self) -> Duration {
        self.gemini_timeout
    }

    #[must_use]
    pub fn sample_cap(&self) -> NonZeroUsize {
        self.sample_cap
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([0, 0, 0, 0], 8501)),
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_timeout: Duration::from_secs(120),
            sample_cap: NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_bind", &self.http_bind)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_timeout", &self.gemini_timeout)
            .field("sample_cap", &self.sample_cap)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<SocketAddr>()
        .map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        })
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let value = parse_usize(name, default)?;
    NonZeroUsize::new(value).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_secs.to_string());
    let secs = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Ok(Duration::from_secs(secs))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}
