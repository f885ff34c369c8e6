//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CRAFTLY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CRAFTLY_SESSION_SECRET` - Secret the session cookie signing key is derived from
//!   (min 32 chars, high entropy)
//!
//! ## Optional
//! - `CRAFTLY_HOST` - Bind address (default: 127.0.0.1)
//! - `CRAFTLY_PORT` - Listen port (default: 8080)
//! - `CRAFTLY_BASE_URL` - Public URL of the API (default: <http://localhost:8080>)
//! - `CRAFTLY_CORS_ORIGINS` - Comma-separated origins allowed to call the API
//! - `CRAFTLY_CATALOG_CACHE_SECS` - Product listing cache TTL (default: 300)
//! - `CRAFTLY_AUTH_RATE_BURST` - Auth requests allowed in a burst per IP (default: 5)
//! - `CRAFTLY_AUTH_RATE_PERIOD_SECS` - Seconds to regain one auth request (default: 6)
//! - `CRAFTLY_API_RATE_BURST` - API requests allowed in a burst per IP (default: 50)
//! - `CRAFTLY_API_RATE_PERIOD_SECS` - Seconds to regain one API request (default: 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use argon2::Argon2;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tower_sessions::cookie::Key;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const SESSION_KEY_SALT: &[u8] = b"craftly-session-cookie";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CATALOG_CACHE_SECS: u64 = 300;

/// Login, registration and password changes: ~10/minute per IP.
const DEFAULT_AUTH_RATE: RateLimit = RateLimit {
    period_secs: 6,
    burst: 5,
};

/// Everything else under `/api`: ~60/minute per IP after a burst of 50.
const DEFAULT_API_RATE: RateLimit = RateLimit {
    period_secs: 1,
    burst: 50,
};

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Per-IP token bucket: `burst` requests at once, then one more every
/// `period_secs` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub period_secs: u64,
    pub burst: u32,
}

/// Cookie signing key stretched from the session secret with Argon2.
///
/// The same secret always yields the same key, so sessions survive restarts
/// and are shared between instances configured alike.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    /// Derive the signing key from `secret`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` if Argon2 rejects the input.
    pub fn derive(secret: &SecretString) -> Result<Self, ConfigError> {
        let mut bytes = [0u8; 64];
        Argon2::default()
            .hash_password_into(
                secret.expose_secret().as_bytes(),
                SESSION_KEY_SALT,
                &mut bytes,
            )
            .map_err(|e| {
                ConfigError::InsecureSecret("CRAFTLY_SESSION_SECRET".to_string(), e.to_string())
            })?;
        Ok(Self(Key::from(bytes.as_slice())))
    }

    #[must_use]
    pub fn key(&self) -> Key {
        self.0.clone()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Signs the session cookie
    pub session_key: SessionKey,
    /// Origins allowed by CORS (the web client)
    pub cors_origins: Vec<String>,
    /// How long product listings stay cached
    pub catalog_cache_ttl: Duration,
    /// Limit on the auth endpoints
    pub auth_rate_limit: RateLimit,
    /// Limit on the rest of the API
    pub api_rate_limit: RateLimit,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CRAFTLY_DATABASE_URL")?;
        let host = get_env_or_default("CRAFTLY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CRAFTLY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CRAFTLY_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CRAFTLY_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("CRAFTLY_BASE_URL", "http://localhost:8080");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CRAFTLY_BASE_URL".to_string(), e.to_string())
        })?;

        let session_secret = get_validated_secret("CRAFTLY_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "CRAFTLY_SESSION_SECRET")?;
        let session_key = SessionKey::derive(&session_secret)?;

        let cors_origins = parse_origins(&get_env_or_default("CRAFTLY_CORS_ORIGINS", ""));
        let catalog_cache_secs = get_env_or_default(
            "CRAFTLY_CATALOG_CACHE_SECS",
            &DEFAULT_CATALOG_CACHE_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CRAFTLY_CATALOG_CACHE_SECS".to_string(), e.to_string())
        })?;

        let auth_rate_limit = get_rate_limit("CRAFTLY_AUTH_RATE", DEFAULT_AUTH_RATE)?;
        let api_rate_limit = get_rate_limit("CRAFTLY_API_RATE", DEFAULT_API_RATE)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_key,
            cors_origins,
            catalog_cache_ttl: Duration::from_secs(catalog_cache_secs),
            auth_rate_limit,
            api_rate_limit,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the API is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read `{prefix}_BURST` and `{prefix}_PERIOD_SECS`, keeping defaults for
/// unset variables. Both must be positive.
fn get_rate_limit(prefix: &str, default: RateLimit) -> Result<RateLimit, ConfigError> {
    let burst_key = format!("{prefix}_BURST");
    let period_key = format!("{prefix}_PERIOD_SECS");
    parse_rate_limit(
        std::env::var(&burst_key).ok().as_deref(),
        std::env::var(&period_key).ok().as_deref(),
        default,
    )
    .map_err(|(key, reason)| {
        let key = if key == "burst" { burst_key } else { period_key };
        ConfigError::InvalidEnvVar(key, reason)
    })
}

fn parse_rate_limit(
    burst: Option<&str>,
    period_secs: Option<&str>,
    default: RateLimit,
) -> Result<RateLimit, (&'static str, String)> {
    let burst = match burst {
        Some(raw) => raw.trim().parse::<u32>().map_err(|e| ("burst", e.to_string()))?,
        None => default.burst,
    };
    let period_secs = match period_secs {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| ("period", e.to_string()))?,
        None => default.period_secs,
    };

    if burst == 0 {
        return Err(("burst", "must be greater than zero".to_string()));
    }
    if period_secs == 0 {
        return Err(("period", "must be greater than zero".to_string()));
    }
    Ok(RateLimit { period_secs, burst })
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_owned())
        .collect()
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    const TEST_SESSION_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    /// Configuration suitable for unit tests (never connects anywhere).
    pub(crate) fn test_config() -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/craftly_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            session_key: SessionKey::derive(&SecretString::from(TEST_SESSION_SECRET)).unwrap(),
            cors_origins: vec!["http://localhost:5173".to_string()],
            catalog_cache_ttl: Duration::from_secs(300),
            auth_rate_limit: DEFAULT_AUTH_RATE,
            api_rate_limit: DEFAULT_API_RATE,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_session_key_is_stable_per_secret() {
        let first = SessionKey::derive(&SecretString::from(TEST_SESSION_SECRET)).unwrap();
        let again = SessionKey::derive(&SecretString::from(TEST_SESSION_SECRET)).unwrap();
        let other =
            SessionKey::derive(&SecretString::from("Zq8%vN1!cR6@hJ3#wE5&yU7*iO9^tG2")).unwrap();

        assert_eq!(first.key().master(), again.key().master());
        assert_ne!(first.key().master(), other.key().master());
    }

    #[test]
    fn test_session_key_debug_is_redacted() {
        let key = SessionKey::derive(&SecretString::from(TEST_SESSION_SECRET)).unwrap();
        assert_eq!(format!("{key:?}"), "SessionKey([REDACTED])");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://localhost:5173/, ,https://craftly.app "),
            vec!["http://localhost:5173", "https://craftly.app"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_rate_limit_defaults_and_overrides() {
        assert_eq!(
            parse_rate_limit(None, None, DEFAULT_AUTH_RATE).unwrap(),
            DEFAULT_AUTH_RATE
        );
        assert_eq!(
            parse_rate_limit(Some("200"), None, DEFAULT_AUTH_RATE).unwrap(),
            RateLimit {
                period_secs: 6,
                burst: 200
            }
        );
        assert_eq!(
            parse_rate_limit(None, Some(" 2 "), DEFAULT_API_RATE).unwrap().period_secs,
            2
        );
    }

    #[test]
    fn test_rate_limit_rejects_zero_and_garbage() {
        assert_eq!(
            parse_rate_limit(Some("0"), None, DEFAULT_AUTH_RATE).unwrap_err().0,
            "burst"
        );
        assert_eq!(
            parse_rate_limit(None, Some("0"), DEFAULT_AUTH_RATE).unwrap_err().0,
            "period"
        );
        assert!(parse_rate_limit(Some("many"), None, DEFAULT_AUTH_RATE).is_err());
    }

    #[test]
    fn test_socket_addr_and_secure() {
        let mut config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
        assert!(!config.is_secure());

        config.base_url = "https://api.craftly.app".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());
        assert!(!debug_output.contains("aB3$xY9"));
        assert!(!debug_output.contains("craftly_test"));
    }
}
