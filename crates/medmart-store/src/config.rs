//! # Store Configuration
//!
//! Where the anonymous cart lives and how checkout behaves.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEDMART_LOCAL_STORAGE=/tmp/medmart_local.json                      │
//! │     MEDMART_CHECKOUT_DELAY_MS=1500                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/medmart/store.toml (Linux)                               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir / local_storage.json, no delay                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # store.toml
//! local_storage_path = "/var/lib/medmart/local_storage.json"
//! checkout_delay_ms = 1500
//! shipping_cents = 999
//! free_shipping_threshold_cents = 10000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use medmart_core::checkout::ShippingPolicy;

use crate::checkout::CheckoutOptions;
use crate::error::{StoreError, StoreResult};
use crate::local::{FileStorage, LocalCart};

const LOCAL_STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file backing local storage.
    #[serde(default = "default_local_storage_path")]
    pub local_storage_path: PathBuf,

    /// Simulated payment processing pause. Default: 0
    #[serde(default)]
    pub checkout_delay_ms: u64,

    #[serde(default = "default_shipping_cents")]
    pub shipping_cents: i64,

    #[serde(default = "default_free_shipping_threshold_cents")]
    pub free_shipping_threshold_cents: i64,
}

fn default_local_storage_path() -> PathBuf {
    directories::ProjectDirs::from("com", "medmart", "medmart")
        .map(|dirs| dirs.data_dir().join(LOCAL_STORAGE_FILE))
        .unwrap_or_else(|| PathBuf::from(".").join(LOCAL_STORAGE_FILE))
}

fn default_shipping_cents() -> i64 {
    ShippingPolicy::default().flat_cents
}

fn default_free_shipping_threshold_cents() -> i64 {
    ShippingPolicy::default().free_threshold_cents
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            local_storage_path: default_local_storage_path(),
            checkout_delay_ms: 0,
            shipping_cents: default_shipping_cents(),
            free_shipping_threshold_cents: default_free_shipping_threshold_cents(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (store.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.shipping_cents < 0 {
            return Err(StoreError::InvalidConfig("shipping_cents must not be negative".into()));
        }
        if self.free_shipping_threshold_cents < 0 {
            return Err(StoreError::InvalidConfig(
                "free_shipping_threshold_cents must not be negative".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("MEDMART_LOCAL_STORAGE") {
            debug!(path = %path, "Overriding local storage path from environment");
            self.local_storage_path = PathBuf::from(path);
        }

        if let Ok(delay) = std::env::var("MEDMART_CHECKOUT_DELAY_MS") {
            match delay.parse::<u64>() {
                Ok(ms) => self.checkout_delay_ms = ms,
                Err(_) => warn!(value = %delay, "Ignoring invalid MEDMART_CHECKOUT_DELAY_MS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "medmart", "medmart").map(|dirs| dirs.config_dir().join("store.toml"))
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            flat_cents: self.shipping_cents,
            free_threshold_cents: self.free_shipping_threshold_cents,
        }
    }

    pub fn checkout_options(&self) -> CheckoutOptions {
        CheckoutOptions {
            shipping: self.shipping_policy(),
            processing_delay: Duration::from_millis(self.checkout_delay_ms),
        }
    }

    /// Opens the file-backed anonymous cart.
    pub fn open_local_cart(&self) -> StoreResult<LocalCart> {
        let storage = FileStorage::open(&self.local_storage_path)?;
        Ok(LocalCart::new(std::sync::Arc::new(storage)))
    }
}
