//! # Repository Module
//!
//! Database repository implementations for MedMart.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler / cart store                                             │
//! │       │                                                                 │
//! │       │  db.carts().add(&user_id, &product_id, 2)                      │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── items(&self, user_id)                                             │
//! │  ├── add(&self, user_id, product_id, qty)                              │
//! │  ├── set_quantity / remove / clear                                     │
//! │  └── merge(&self, user_id, lines)                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Accounts, credentials, avatars, supplier directory
//! - [`category::CategoryRepository`] - Product categories
//! - [`product::ProductRepository`] - Supplier listings
//! - [`cart::CartRepository`] - Remote per-user cart rows
//! - [`order::OrderRepository`] - Order placement and history
//! - [`notification::NotificationRepository`] - In-app notifications
//! - [`activity::ActivityRepository`] - Admin activity feed
//! - [`dashboard::DashboardRepository`] - Dashboard aggregates

pub mod activity;
pub mod cart;
pub mod category;
pub mod dashboard;
pub mod notification;
pub mod order;
pub mod product;
pub mod user;

/// Test fixtures shared by the repository tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use medmart_core::{Product, User, UserRole};

    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use crate::repository::user::NewUser;

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, email: &str, role: UserRole) -> User {
        db.users()
            .create(&NewUser {
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                full_name: format!("User {}", email),
                role,
                company_name: (role == UserRole::Supplier).then(|| format!("{} Supply Co", email)),
            })
            .await
            .unwrap()
    }

    pub async fn product(db: &Database, supplier_id: &str, sku: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(&NewProduct {
                supplier_id: supplier_id.to_string(),
                category_id: None,
                sku: sku.to_string(),
                name: format!("Product {}", sku),
                description: None,
                price_cents,
                stock,
                image_url: None,
            })
            .await
            .unwrap()
    }
}
