//! Configuration for the directory client.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default platform API root.
pub const DEFAULT_BASE_URL: &str = "https://webexapis.com/v1";

/// Transport settings for [`crate::WebexClient`].
///
/// The bearer credential lives in [`BearerToken`], never in this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// API root, e.g. `https://webexapis.com/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for each HTTP request.
    #[serde(with = "duration_secs", default = "default_timeout", rename = "timeout_secs")]
    pub timeout: Duration,

    /// Maximum retries for rate-limited or transient responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Page size requested from list endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// First backoff delay; doubles on every retry.
    #[serde(with = "duration_millis", default = "default_retry_base_delay", rename = "retry_base_delay_ms")]
    pub retry_base_delay: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            page_size: default_page_size(),
            retry_base_delay: default_retry_base_delay(),
        }
    }
}

impl DirectoryConfig {
    /// Create a config pointing at the given API root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the page size for list endpoints.
    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the first backoff delay.
    #[must_use]
    pub const fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Override fields that are set in the environment.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn merge_env(mut self) -> Self {
        if let Ok(url) = std::env::var("ROOMSYNC_BASE_URL") {
            self.base_url = url;
        }

        if let Some(secs) = env_number::<u64>("ROOMSYNC_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = env_number("ROOMSYNC_MAX_RETRIES") {
            self.max_retries = retries;
        }

        if let Some(size) = env_number("ROOMSYNC_PAGE_SIZE") {
            self.page_size = size;
        }

        self
    }

    /// Parse the API root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL does not parse or cannot
    /// carry path segments.
    pub fn api_root(&self) -> Result<Url> {
        let url: Url = self
            .base_url
            .parse()
            .map_err(|e| Error::config(format!("invalid base URL '{}': {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base URL '{}' cannot be used as an API root",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Reject settings the client cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero page size or an unusable base URL.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::config("page_size must be greater than zero"));
        }
        self.api_root().map(|_| ())
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring non-numeric environment value");
    }
    parsed
}

/// Opaque bearer credential for one run.
///
/// Obtaining and refreshing it (OAuth) happens outside roomsync. The value is
/// never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the token is blank.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(Error::config("bearer token is empty"));
        }
        Ok(Self(token))
    }

    /// Read the token from `ROOMSYNC_TOKEN`, then `WEBEX_ACCESS_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when neither variable is set.
    pub fn from_env() -> Result<Self> {
        std::env::var("ROOMSYNC_TOKEN")
            .or_else(|_| std::env::var("WEBEX_ACCESS_TOKEN"))
            .map_err(|_| Error::config("no token: set ROOMSYNC_TOKEN or WEBEX_ACCESS_TOKEN"))
            .and_then(Self::new)
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_page_size() -> u32 {
    100
}

const fn default_retry_base_delay() -> Duration {
    Duration::from_secs(1)
}

/// Serialization helper for Duration as seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serialization helper for Duration as milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        let config = DirectoryConfig::default();
        assert_eq!(config.base_url, "https://webexapis.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = DirectoryConfig::with_base_url("http://127.0.0.1:8080/v1")
            .timeout(Duration::from_secs(5))
            .max_retries(0)
            .page_size(25)
            .retry_base_delay(Duration::from_millis(10));

        assert_eq!(config.api_root().unwrap().as_str(), "http://127.0.0.1:8080/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.retry_base_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = DirectoryConfig::with_base_url("not a url");
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = DirectoryConfig::with_base_url("mailto:ops@example.com");
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = DirectoryConfig::default().page_size(0);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: DirectoryConfig = toml::from_str("timeout_secs = 10\npage_size = 50\n").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: std::result::Result<DirectoryConfig, _> = toml::from_str("token = \"abc\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("secret-value").unwrap();
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
        assert_eq!(token.expose(), "secret-value");
    }

    #[test]
    fn test_blank_token_rejected() {
        assert!(BearerToken::new("   ").is_err());
    }
}
