//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the remote cart API
//!
//! ## Optional
//! - `CART_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `CART_STORE_DIR` - Directory for the persisted anonymous cart
//!   (default: cartwheel-data)
//! - `CART_TTL_DAYS` - Lifetime of the persisted anonymous cart
//!   (default: 7)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct CartEngineConfig {
    /// Remote cart API configuration.
    pub remote: RemoteCartConfig,
    /// Directory for the persisted anonymous cart.
    pub store_dir: PathBuf,
    /// Lifetime of the persisted anonymous cart.
    pub ttl: chrono::Duration,
}

/// Remote cart API configuration.
#[derive(Debug, Clone)]
pub struct RemoteCartConfig {
    /// Base URL of the cart API.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CartEngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "CART_API_BASE_URL",
            &get_required_env("CART_API_BASE_URL")?,
        )?;
        let timeout_secs = parse_positive_u64(
            "CART_API_TIMEOUT_SECS",
            &get_env_or_default("CART_API_TIMEOUT_SECS", "10"),
        )?;
        let store_dir = PathBuf::from(get_env_or_default("CART_STORE_DIR", "cartwheel-data"));
        let ttl_days = parse_positive_u64(
            "CART_TTL_DAYS",
            &get_env_or_default("CART_TTL_DAYS", "7"),
        )?;

        Ok(Self {
            remote: RemoteCartConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            store_dir,
            ttl: chrono::Duration::days(i64::try_from(ttl_days).map_err(|e| {
                ConfigError::InvalidEnvVar("CART_TTL_DAYS".to_string(), e.to_string())
            })?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and validate an API base URL.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL cannot hold a path".to_string(),
        ));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse a strictly positive integer.
fn parse_positive_u64(var_name: &str, value: &str) -> Result<u64, ConfigError> {
    let parsed = value
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if parsed == 0 {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(parsed)
}
