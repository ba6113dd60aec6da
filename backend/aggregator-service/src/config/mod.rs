use resilience::TimeoutConfig;
use serde::Deserialize;
use std::fmt;

/// Process configuration, read once at startup and injected into the
/// aggregator. Nothing reads the environment after this point.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream API root, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Bearer token sent on every upstream call
    pub access_token: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Comma separated list; `*` allows any origin
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_timeout_secs() -> u64 {
    TimeoutConfig::DEFAULT_SECS
}

fn default_max_concurrent_requests() -> usize {
    32
}

fn default_cors_allowed_origins() -> String {
    "http://localhost:3000".to_string()
}

impl Config {
    /// Load from the process environment, after merging an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from an explicit set of `NAME=value` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("BASE_URL must not be empty".into()));
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Invalid("ACCESS_TOKEN must not be empty".into()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "MAX_CONCURRENT_REQUESTS must be at least 1".into(),
            ));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "UPSTREAM_TIMEOUT_SECS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> TimeoutConfig {
        TimeoutConfig::from_secs(self.upstream_timeout_secs)
    }

    pub fn cors_origins(&self) -> impl Iterator<Item = &str> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}
