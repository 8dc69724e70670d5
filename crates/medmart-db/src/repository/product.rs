//! # Product Repository
//!
//! Database operations for supplier listings.
//!
//! ## Key Operations
//! - Listing (storefront, supplier dashboard)
//! - CRUD for the owning supplier
//! - Soft delete via `is_active`
//!
//! Filtering and sorting for the storefront happen in
//! `medmart_core::catalog` over the list returned here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use medmart_core::Product;

use crate::error::{DbError, DbResult};

/// Product columns, qualified with the `p` alias.
pub(crate) const PRODUCT_COLUMNS: &str = r#"
    p.id, p.supplier_id, p.category_id, p.sku, p.name, p.description,
    p.price_cents, p.stock, p.image_url, p.is_active, p.created_at, p.updated_at
"#;

/// Fields a supplier provides when listing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub supplier_id: String,
    pub category_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub image_url: Option<String>,
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("uuid-here").await?;
/// let mine = repo.list(Some(&supplier_id), true).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID, listed or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products p WHERE p.id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products, newest first.
    ///
    /// ## Arguments
    /// * `supplier_id` - restrict to one supplier's listings
    /// * `include_inactive` - include soft-deleted listings
    pub async fn list(&self, supplier_id: Option<&str>, include_inactive: bool) -> DbResult<Vec<Product>> {
        debug!(supplier_id = ?supplier_id, include_inactive, "Listing products");

        let sql = format!(
            r#"
            SELECT {}
            FROM products p
            WHERE (?1 IS NULL OR p.supplier_id = ?1)
            AND (?2 = 1 OR p.is_active = 1)
            ORDER BY p.created_at DESC, p.id
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(supplier_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Inserts a new listing.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on `sku` if the supplier already uses it.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, sku = %new.sku, supplier_id = %new.supplier_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, supplier_id, category_id, sku, name, description,
                price_cents, stock, image_url, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&new.supplier_id)
        .bind(&new.category_id)
        .bind(&new.sku)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(new.stock)
        .bind(&new.image_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &new.sku),
            other => other,
        })?;

        info!(id = %id, sku = %new.sku, "Product listed");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &id))
    }

    /// Applies a partial update and returns the updated product.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = COALESCE(?2, category_id),
                name        = COALESCE(?3, name),
                description = COALESCE(?4, description),
                price_cents = COALESCE(?5, price_cents),
                stock       = COALESCE(?6, stock),
                image_url   = COALESCE(?7, image_url),
                is_active   = COALESCE(?8, is_active),
                updated_at  = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.category_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price_cents)
        .bind(update.stock)
        .bind(&update.image_url)
        .bind(update.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists or delists a product (soft delete).
    ///
    /// Delisting keeps order history intact; existing cart rows stay but
    /// checkout rejects them.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
