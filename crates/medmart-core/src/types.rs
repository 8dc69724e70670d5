//! # Domain Types
//!
//! Core domain types used throughout MedMart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │    Product      │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  email          │◄──│  supplier_id    │   │  order_number   │       │
//! │  │  role           │   │  sku, name      │   │  buyer_id       │       │
//! │  │  company_name   │   │  price_cents    │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   UserRole      │   │  OrderStatus    │   │  ActivityKind   │       │
//! │  │  Buyer          │   │  Pending        │   │  UserSignedUp   │       │
//! │  │  Supplier       │   │  Processing     │   │  ProductListed  │       │
//! │  │  Admin          │   │  Shipped ...    │   │  OrderPlaced    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, order_number, email) - human-readable

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// User Role
// =============================================================================

/// The three kinds of marketplace accounts.
///
/// Each role gets its own dashboard; admin additionally sees marketplace-wide
/// statistics and the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserRole {
    /// Hospitals, clinics, pharmacies buying supplies.
    Buyer,
    /// Manufacturers and distributors listing products.
    Supplier,
    /// Marketplace operators.
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Buyer => "buyer",
            UserRole::Supplier => "supplier",
            UserRole::Admin => "admin",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Buyer
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(UserRole::Buyer),
            "supplier" => Ok(UserRole::Supplier),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["buyer".into(), "supplier".into(), "admin".into()],
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// Public profile of a marketplace account.
///
/// The password hash never leaves medmart-db; see `UserRecord` there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    /// Organisation name. Required for suppliers, optional otherwise.
    pub company_name: Option<String>,
    pub has_avatar: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product listed by a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Supplier (user id) that owns the listing.
    pub supplier_id: String,

    pub category_id: Option<String>,

    /// Stock Keeping Unit - supplier's business identifier.
    pub sku: String,

    /// Display name shown on the storefront.
    pub name: String,

    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units available.
    pub stock: i64,

    pub image_url: Option<String>,

    /// Whether product is listed (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active, out-of-stock listing with the given identity and price.
    pub fn new(
        id: impl Into<String>,
        supplier_id: impl Into<String>,
        sku: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            supplier_id: supplier_id.into(),
            category_id: None,
            sku: sku.into(),
            name: name.into(),
            description: None,
            price_cents,
            stock: 0,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Checks if an order for `quantity` units can be fulfilled.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.is_active && self.stock >= quantity
    }
}

/// A product category (e.g. "Wound Care", "Diagnostics").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// URL-safe identifier used by storefront links.
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

/// Storefront view of a supplier account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub company_name: String,
    /// Number of active listings.
    pub product_count: i64,
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderStatus {
    /// Placed, awaiting supplier action.
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// Shipping address and payment summary are frozen on the order itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable number printed on confirmations: `MM-YYYYMMDD-XXXXXX`.
    pub order_number: String,
    pub buyer_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub ship_name: String,
    pub ship_line1: String,
    pub ship_line2: Option<String>,
    pub ship_city: String,
    pub ship_region: String,
    pub ship_postal_code: String,
    pub ship_country: String,
    /// Card brand as detected at checkout ("visa", "mastercard", ...).
    pub payment_brand: String,
    /// Last four digits of the card. The full number is never stored.
    pub payment_last4: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub supplier_id: String,
    /// SKU at time of purchase (frozen).
    pub sku_snapshot: String,
    /// Product name at time of purchase (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of purchase (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Notifications & Activity
// =============================================================================

/// An in-app notification shown in a user's bell menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Kind of entry in the admin activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActivityKind {
    UserSignedUp,
    ProductListed,
    ProductUpdated,
    ProductDelisted,
    OrderPlaced,
}

/// One entry of the admin "recent activity" feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActivityEntry {
    pub id: String,
    pub actor_id: Option<String>,
    pub kind: ActivityKind,
    pub message: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Dashboards
// =============================================================================

/// Marketplace-wide counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminStats {
    pub total_users: i64,
    pub buyers: i64,
    pub suppliers: i64,
    pub admins: i64,
    pub total_products: i64,
    pub active_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub revenue_cents: i64,
}

/// Data behind the buyer dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BuyerDashboard {
    pub order_count: i64,
    pub total_spent_cents: i64,
    pub recent_orders: Vec<Order>,
    pub unread_notifications: i64,
}

/// Data behind the supplier dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierDashboard {
    pub product_count: i64,
    pub active_product_count: i64,
    /// Active listings with stock at or below the low-stock threshold.
    pub low_stock: Vec<Product>,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Stock level at or below which a listing shows up as "low stock".
pub const LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Unit Tests
// =============================================================================
