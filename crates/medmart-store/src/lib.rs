//! # medmart-store: Cart Store for MedMart
//!
//! The state layer a storefront client holds: the current cart, who is
//! signed in, and checkout submission.
//!
//! ## Anonymous vs Authenticated
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ANONYMOUS                            AUTHENTICATED                     │
//! │  ─────────                            ─────────────                     │
//! │  LocalCart (key "cart")               RemoteCart (per-user rows)        │
//! │  mutate + rewrite JSON                write, then refetch               │
//! │            │                                   ▲                        │
//! │            └──── sign in: merge, clear local ──┘                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`cart_store`] - The reactive cart store
//! - [`local`] - Local storage and the anonymous cart
//! - [`remote`] - The remote cart seam and its database implementation
//! - [`session`] - Auth state published over `watch`
//! - [`checkout`] - Order submission
//! - [`config`] - Store configuration
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medmart_store::{CartStore, DbRemoteCart, SessionHandle, StoreConfig};
//!
//! let config = StoreConfig::load(None)?;
//! let session = SessionHandle::new();
//! let (cart, _listener) = CartStore::start(
//!     config.open_local_cart()?,
//!     Arc::new(DbRemoteCart::new(db.carts())),
//!     session.clone(),
//! )
//! .await;
//!
//! cart.add_item(&product, 2).await?;
//! let mut updates = cart.subscribe();
//! ```

pub mod cart_store;
pub mod checkout;
pub mod config;
pub mod error;
pub mod local;
pub mod remote;
pub mod session;

pub use cart_store::{CartSnapshot, CartStore};
pub use checkout::{place_order, CheckoutOptions};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use local::{FileStorage, LocalCart, LocalStorage, MemoryStorage};
pub use remote::{DbRemoteCart, RemoteCart};
pub use session::{AuthEvent, AuthState, Session, SessionHandle};
