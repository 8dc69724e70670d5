//! # Store Error Types
//!
//! Error types for cart store and checkout submission.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Local storage  │  │     Remote cart         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Io             │  │  Remote (DbError)       │ │
//! │  │  ConfigLoad     │  │  Serialization  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────────────────────────────┐  │
//! │  │    Session      │  │     Checkout                                │  │
//! │  │                 │  │                                             │  │
//! │  │  NotAuthenticated│ │  Checkout (CoreError), EmptyCart            │  │
//! │  │  SessionMismatch│  │  Validation                                 │  │
//! │  └─────────────────┘  └─────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use medmart_core::{CoreError, ValidationError};
use medmart_db::DbError;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Local Storage Errors
    // =========================================================================
    #[error("Local storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Remote Cart Errors
    // =========================================================================
    /// The remote cart could not be read or written.
    #[error("Remote cart error: {0}")]
    Remote(#[from] DbError),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Sign in required")]
    NotAuthenticated,

    /// A token refresh named a different user than the signed-in one.
    #[error("Session belongs to {current}, refresh was for {refreshed}")]
    SessionMismatch { current: String, refreshed: String },

    // =========================================================================
    // Cart / Checkout Errors
    // =========================================================================
    #[error("Cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Checkout(#[from] CoreError),
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl StoreError {
    /// Whether the error came from the remote cart rather than bad input.
    pub fn is_remote(&self) -> bool {
        matches!(self, StoreError::Remote(_))
    }
}
