//! Client configuration.
//!
//! # Environment Variables
//!
//! - `CRAFTLY_API_URL` - Base URL of the API (default: <http://localhost:8080>)
//! - `CRAFTLY_CLIENT_CACHE_SECS` - Repository cache TTL (default: 60)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_CACHE_SECS: u64 = 60;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the API lives and how long repository caches stay fresh.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, always ending in `/`.
    pub base_url: Url,
    /// Lifetime of single-entry repository caches.
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Build a configuration for `base_url` with the default cache TTL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL doesn't parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_SECS),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("CRAFTLY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let cache_secs = match std::env::var("CRAFTLY_CLIENT_CACHE_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("CRAFTLY_CLIENT_CACHE_SECS".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_CACHE_SECS,
        };

        Ok(Self {
            base_url: parse_base_url(&base_url)?,
            cache_ttl: Duration::from_secs(cache_secs),
        })
    }

    /// Replace the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Parse a base URL and make sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("CRAFTLY_API_URL".to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new("https://craftly.app/backend").unwrap();
        assert_eq!(config.base_url.as_str(), "https://craftly.app/backend/");
        assert_eq!(
            config.base_url.join("api/cart").unwrap().as_str(),
            "https://craftly.app/backend/api/cart"
        );
    }

    #[test]
    fn test_root_url() {
        let config = ClientConfig::new("http://localhost:8080").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_url() {
        assert!(ClientConfig::new("not a url").is_err());
    }
}
