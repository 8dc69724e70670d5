//! # medmart-db: Database Layer for MedMart
//!
//! This crate provides persistence for the MedMart marketplace: accounts,
//! catalog, the per-user remote cart rows, orders, notifications and the
//! admin activity feed. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MedMart Data Flow                                │
//! │                                                                         │
//! │  apps/api handler / medmart-store DbRemoteCart                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    medmart-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial_ │  │   │
//! │  │   │               │    │ CartRepo      │    │   schema.sql │  │   │
//! │  │   │               │    │ OrderRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (medmart.db, WAL mode)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`password`] - Argon2 credential hashing
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medmart_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("medmart.db")).await?;
//!
//! let items = db.carts().items(&user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::activity::ActivityRepository;
pub use repository::cart::CartRepository;
pub use repository::category::CategoryRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::notification::NotificationRepository;
pub use repository::order::{NewOrder, OrderRepository};
pub use repository::product::{NewProduct, ProductRepository, ProductUpdate};
pub use repository::user::{NewUser, UserRecord, UserRepository};
