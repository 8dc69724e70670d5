//! # medmart-core: Pure Business Logic for MedMart
//!
//! This crate is the **heart** of the MedMart marketplace. It contains the
//! domain types and all business rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MedMart Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Storefront / Buyer / Supplier / Admin views          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      apps/api (axum)          medmart-store (cart store)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ medmart-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌───────┐ ┌──────┐ ┌──────────┐ ┌───────────┐   │   │
//! │  │   │  types  │ │ money │ │ cart │ │ checkout │ │  catalog  │   │   │
//! │  │   └─────────┘ └───────┘ └──────┘ └──────────┘ └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 medmart-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, User, Order, Notification, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart line items and cart math
//! - [`checkout`] - The address → payment → review wizard
//! - [`catalog`] - In-memory product filtering, sorting, pagination
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use medmart_core::cart::Cart;
//! use medmart_core::types::Product;
//!
//! let mut cart = Cart::new();
//! let gloves = Product::new("p1", "supplier-1", "GLV-NIT-M", "Nitrile Gloves (M)", 100);
//!
//! cart.add_item(&gloves, 2).unwrap();
//! cart.add_item(&gloves, 3).unwrap();
//!
//! assert_eq!(cart.quantity_of("p1"), Some(5));
//! assert_eq!(cart.subtotal().cents(), 500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Key under which the anonymous cart is kept in local storage.
///
/// The stored value is a JSON array of [`CartItem`].
pub const LOCAL_CART_KEY: &str = "cart";

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;
