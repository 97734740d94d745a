//! Client configuration.

use std::env;
use std::time::Duration;

/// Default service root, matching a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Scheme placed in front of the token in the `Authorization` header.
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Base URL must start with http:// or https://: {0}")]
    InvalidBaseUrl(String),
}

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root; endpoint paths are appended to it.
    pub base_url: String,
    /// Timeout applied to every HTTP request.
    pub timeout: Duration,
    pub auth_scheme: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            user_agent: Self::default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn default_user_agent() -> String {
        format!("blog-client/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Read overrides from `BLOG_SERVER_URL`, `BLOG_TIMEOUT_SECS` and
    /// `BLOG_AUTH_SCHEME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("BLOG_SERVER_URL") {
            config.base_url = url;
        }
        if let Ok(secs) = env::var("BLOG_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| ConfigError::InvalidValue {
                name: "BLOG_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(scheme) = env::var("BLOG_AUTH_SCHEME") {
            config.auth_scheme = scheme;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.auth_scheme.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "auth_scheme",
                value: self.auth_scheme.clone(),
            });
        }
        Ok(())
    }
}
