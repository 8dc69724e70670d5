//! # MedMart API
//!
//! HTTP JSON server for the storefront, the role dashboards and the admin
//! console.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Routes                                     │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth          │  │  Catalog       │  │  Cart / Checkout           ││
//! │  │                │  │                │  │                            ││
//! │  │ • signup       │  │ • products     │  │ • cart, cart/items         ││
//! │  │ • login        │  │ • categories   │  │ • cart/merge               ││
//! │  │ • refresh      │  │ • suppliers    │  │ • checkout, orders         ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Account       │  │  Dashboards    │  │  Admin                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • user         │  │ • buyer        │  │ • stats                    ││
//! │  │ • avatar       │  │ • supplier     │  │ • recent-activity          ││
//! │  │ • notifications│  │                │  │ • users                    ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `MEDMART_PORT` - HTTP port (default: 8080)
//! - `MEDMART_DB_PATH` - SQLite database file
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 3600)
//! - `JWT_REFRESH_LIFETIME_SECS` - Refresh token lifetime (default: 604800)
//! - `MEDMART_SHIPPING_CENTS` - Flat shipping (default: 999)
//! - `MEDMART_FREE_SHIPPING_THRESHOLD_CENTS` - Free shipping from (default: 10000)
//! - `MEDMART_MAX_AVATAR_BYTES` - Avatar upload limit (default: 1 MiB)

use std::sync::Arc;

use medmart_db::Database;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

// Re-exports
pub use auth::{AuthUser, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;

/// Shared application state.
///
/// Cheap to clone; handlers receive their own copy.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}
