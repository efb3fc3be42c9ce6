//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: `http://localhost:3000`)
//! - `STOREFRONT_DATA_DIR` - Directory holding the durable account store
//!   (default: data)
//! - `CATALOG_BASE_URL` - Remote product catalog (default: `https://dummyjson.com`)
//! - `CATALOG_LIST_SKIP` - Offset of the product list page (default: 5)
//! - `CATALOG_LIST_LIMIT` - Size of the product list page (default: 8)
//! - `CATALOG_DETAIL_CACHE_SECS` - Lifetime of cached product details, 0 disables
//!   (default: 300)
//! - `CATALOG_TIMEOUT_SECS` - Request timeout for catalog calls (default: none)
//! - `PASSWORD_HASH_MEMORY_KIB` - Argon2 memory cost (default: 19456)
//! - `PASSWORD_HASH_ITERATIONS` - Argon2 time cost (default: 2)
//! - `PASSWORD_HASH_PARALLELISM` - Argon2 lanes (default: 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::models::PageParams;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory of the durable key-value store
    pub data_dir: PathBuf,
    /// Remote catalog settings
    pub catalog: CatalogConfig,
    /// Password hashing work factor
    pub password_cost: PasswordCost,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Remote product catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog root, without a trailing slash.
    pub base_url: Url,
    /// `skip` parameter of the product list request.
    pub list_skip: u32,
    /// `limit` parameter of the product list request.
    pub list_limit: u32,
    /// How long a fetched product detail is reused. Zero disables reuse.
    pub detail_cache_ttl: Duration,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordCost {
    /// The cheapest parameters Argon2 accepts. Only for tests and tooling.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = parse_or_default(&lookup, "STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or_default(&lookup, "STOREFRONT_PORT", 3000_u16)?;
        let base_url = get_or_default(&lookup, "STOREFRONT_BASE_URL", "http://localhost:3000");
        let data_dir = PathBuf::from(get_or_default(&lookup, "STOREFRONT_DATA_DIR", "data"));

        let catalog = CatalogConfig::from_lookup(&lookup)?;

        let password_cost = PasswordCost {
            memory_kib: parse_or_default(
                &lookup,
                "PASSWORD_HASH_MEMORY_KIB",
                argon2::Params::DEFAULT_M_COST,
            )?,
            iterations: parse_or_default(
                &lookup,
                "PASSWORD_HASH_ITERATIONS",
                argon2::Params::DEFAULT_T_COST,
            )?,
            parallelism: parse_or_default(
                &lookup,
                "PASSWORD_HASH_PARALLELISM",
                argon2::Params::DEFAULT_P_COST,
            )?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            data_dir,
            catalog,
            password_cost,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CatalogConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = get_or_default(lookup, "CATALOG_BASE_URL", "https://dummyjson.com");
        let base_url = Url::parse(raw_url.trim_end_matches('/')).map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_BASE_URL".to_string(), e.to_string())
        })?;

        let detail_cache_secs = parse_or_default(lookup, "CATALOG_DETAIL_CACHE_SECS", 300_u64)?;
        let request_timeout = match lookup("CATALOG_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(parse_value("CATALOG_TIMEOUT_SECS", &value)?)),
            None => None,
        };

        Ok(Self {
            base_url,
            list_skip: parse_or_default(lookup, "CATALOG_LIST_SKIP", 5_u32)?,
            list_limit: parse_or_default(lookup, "CATALOG_LIST_LIMIT", 8_u32)?,
            detail_cache_ttl: Duration::from_secs(detail_cache_secs),
            request_timeout,
        })
    }

    /// The catalog root as a string without a trailing slash.
    #[must_use]
    pub fn root(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Paging of the product list request.
    #[must_use]
    pub const fn page(&self) -> PageParams {
        PageParams {
            skip: self.list_skip,
            limit: self.list_limit,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| parse_value(key, &value))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.catalog.root(), "https://dummyjson.com");
        assert_eq!(config.catalog.list_skip, 5);
        assert_eq!(config.catalog.list_limit, 8);
        assert_eq!(config.catalog.detail_cache_ttl, Duration::from_secs(300));
        assert!(config.catalog.request_timeout.is_none());
        assert_eq!(config.password_cost, PasswordCost::default());
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "8080"),
            ("STOREFRONT_BASE_URL", "https://shop.example.com"),
            ("STOREFRONT_DATA_DIR", "/var/lib/marketstall"),
            ("CATALOG_BASE_URL", "http://127.0.0.1:9000/"),
            ("CATALOG_LIST_SKIP", "0"),
            ("CATALOG_LIST_LIMIT", "30"),
            ("CATALOG_DETAIL_CACHE_SECS", "0"),
            ("CATALOG_TIMEOUT_SECS", "10"),
            ("PASSWORD_HASH_ITERATIONS", "3"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.is_secure());
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/marketstall"));
        assert_eq!(config.catalog.root(), "http://127.0.0.1:9000");
        assert_eq!(config.catalog.list_skip, 0);
        assert_eq!(config.catalog.list_limit, 30);
        assert_eq!(config.catalog.detail_cache_ttl, Duration::ZERO);
        assert_eq!(
            config.catalog.request_timeout,
            Some(Duration::from_secs(10))
        );
        assert_eq!(config.password_cost.iterations, 3);
        assert_eq!(
            config.sentry_dsn.as_deref(),
            Some("https://key@sentry.example.com/1")
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("STOREFRONT_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_invalid_catalog_url() {
        let err = config_from(&[("CATALOG_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CATALOG_BASE_URL"));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = config_from(&[("CATALOG_TIMEOUT_SECS", "-5")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CATALOG_TIMEOUT_SECS"));
    }
}
