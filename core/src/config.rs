//! Client configuration.
//!
//! A `ClientConfig` can be built in code or loaded from the environment:
//!
//! ```bash
//! export TRANCO_BASE_URL="https://tranco-list.eu"   # optional
//! export TRANCO_USERNAME="me@example.com"           # optional, with password
//! export TRANCO_PASSWORD="api-key"                  # optional, with username
//! export TRANCO_TIMEOUT_SECS="30"                   # optional
//! ```
//!
//! Credentials are only needed for `auth_test` and `create_list`. Their
//! presence is checked when those calls are made, not at construction.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Production host of the Tranco API.
pub const DEFAULT_BASE_URL: &str = "https://tranco-list.eu";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("tranco-client/", env!("CARGO_PKG_VERSION"));

/// Errors raised while assembling a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Username/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Both parts are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Value of the `Authorization` header for these credentials.
    pub fn basic_auth_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Settings used to construct a `TrancoClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-request timeout applied by the default transport.
    pub timeout: Duration,
    pub user_agent: String,
    pub credentials: Option<Credentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `TRANCO_*` environment variables, reading a
    /// `.env` file first if one exists.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidVar` if `TRANCO_TIMEOUT_SECS` is not a
    /// positive whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("TRANCO_BASE_URL").filter(|v| !v.is_empty()) {
            config.base_url = base_url;
        }

        if let Some(raw) = lookup("TRANCO_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidVar {
                    var: "TRANCO_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidVar {
                    var: "TRANCO_TIMEOUT_SECS",
                    value: raw,
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let (Some(username), Some(password)) =
            (lookup("TRANCO_USERNAME"), lookup("TRANCO_PASSWORD"))
        {
            config.credentials = Some(Credentials::new(username, password));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }
}
