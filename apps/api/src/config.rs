//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use medmart_core::checkout::ShippingPolicy;

const DEV_JWT_SECRET: &str = "medmart-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Flat shipping charged below the free-shipping threshold
    pub shipping_cents: i64,

    /// Subtotal at which shipping becomes free
    pub free_shipping_threshold_cents: i64,

    /// Largest accepted avatar upload (default: 1 MiB)
    pub max_avatar_bytes: usize,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: parse_var("MEDMART_PORT", "8080")?,

            database_path: env::var("MEDMART_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }),

            jwt_access_lifetime_secs: parse_var("JWT_ACCESS_LIFETIME_SECS", "3600")?, // 1 hour

            jwt_refresh_lifetime_secs: parse_var("JWT_REFRESH_LIFETIME_SECS", "604800")?, // 7 days

            shipping_cents: parse_var("MEDMART_SHIPPING_CENTS", "999")?,

            free_shipping_threshold_cents: parse_var("MEDMART_FREE_SHIPPING_THRESHOLD_CENTS", "10000")?,

            max_avatar_bytes: parse_var("MEDMART_MAX_AVATAR_BYTES", "1048576")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests: in-process defaults, no environment.
    pub fn for_tests() -> Self {
        ApiConfig {
            port: 0,
            database_path: PathBuf::from(":memory:"),
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            jwt_refresh_lifetime_secs: 86400,
            shipping_cents: 999,
            free_shipping_threshold_cents: 10_000,
            max_avatar_bytes: 1024,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if self.jwt_refresh_lifetime_secs <= self.jwt_access_lifetime_secs {
            return Err(ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()));
        }
        if self.shipping_cents < 0 {
            return Err(ConfigError::InvalidValue("MEDMART_SHIPPING_CENTS".to_string()));
        }
        if self.free_shipping_threshold_cents < 0 {
            return Err(ConfigError::InvalidValue("MEDMART_FREE_SHIPPING_THRESHOLD_CENTS".to_string()));
        }
        Ok(())
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            flat_cents: self.shipping_cents,
            free_threshold_cents: self.free_shipping_threshold_cents,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "medmart", "medmart")
        .map(|dirs| dirs.data_dir().join("medmart.db"))
        .unwrap_or_else(|| PathBuf::from("./medmart.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
