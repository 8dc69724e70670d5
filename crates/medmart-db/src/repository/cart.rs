//! # Cart Repository
//!
//! The remote, per-user cart rows that back an authenticated cart.
//!
//! ## Row Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart_items                                                             │
//! │  ───────────────────────────────────────────────────────────────────    │
//! │  user_id │ product_id │ quantity      UNIQUE(user_id, product_id)       │
//! │  u-1     │ p-gloves   │ 3                                               │
//! │  u-1     │ p-gauze    │ 1                                               │
//! │                                                                         │
//! │  add          → INSERT .. ON CONFLICT DO UPDATE quantity += n (sat.)    │
//! │  set_quantity → n < 1 ? DELETE : UPDATE quantity = n                    │
//! │  merge        → add for every local line, one transaction               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads join the current product row, so a fetched cart always carries
//! up-to-date prices.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use medmart_core::{CartItem, Product};

use crate::error::DbResult;
use crate::repository::product::PRODUCT_COLUMNS;

const UPSERT_ADD: &str = r#"
    INSERT INTO cart_items (id, user_id, product_id, quantity, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?5)
    ON CONFLICT (user_id, product_id)
    DO UPDATE SET
        quantity = CASE
            WHEN quantity > 9223372036854775807 - excluded.quantity THEN 9223372036854775807
            ELSE quantity + excluded.quantity
        END,
        updated_at = excluded.updated_at
"#;

#[derive(sqlx::FromRow)]
struct CartRow {
    #[sqlx(flatten)]
    product: Product,
    quantity: i64,
}

#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Fetches a user's cart lines in the order they were first added.
    pub async fn items(&self, user_id: &str) -> DbResult<Vec<CartItem>> {
        let sql = format!(
            r#"
            SELECT {}, c.quantity
            FROM cart_items c
            INNER JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?1
            ORDER BY c.created_at, c.rowid
            "#,
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query_as::<_, CartRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = %user_id, lines = rows.len(), "Fetched remote cart");

        Ok(rows
            .into_iter()
            .map(|row| CartItem::new(row.product, row.quantity))
            .collect())
    }

    /// Adds `quantity` units, creating the row or incrementing it.
    ///
    /// Callers validate `quantity >= 1`; the table CHECK rejects anything else.
    pub async fn add(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<()> {
        debug!(user_id = %user_id, product_id = %product_id, quantity, "Adding to remote cart");

        sqlx::query(UPSERT_ADD)
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Sets a line's quantity; below 1 deletes the row.
    ///
    /// Returns whether a row changed. A product not in the cart is a no-op.
    pub async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<bool> {
        if quantity < 1 {
            return self.remove(user_id, product_id).await;
        }

        debug!(user_id = %user_id, product_id = %product_id, quantity, "Setting remote cart quantity");

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?3, updated_at = ?4 WHERE user_id = ?1 AND product_id = ?2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a line. Idempotent.
    pub async fn remove(&self, user_id: &str, product_id: &str) -> DbResult<bool> {
        debug!(user_id = %user_id, product_id = %product_id, "Removing from remote cart");

        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every line of the user's cart. Returns the number removed.
    pub async fn clear(&self, user_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        debug!(user_id = %user_id, removed = result.rows_affected(), "Cleared remote cart");
        Ok(result.rows_affected())
    }

    /// Merges local lines into the remote cart in one transaction:
    /// existing lines are incremented, new lines inserted.
    ///
    /// Lines whose product no longer exists are skipped rather than failing
    /// the whole merge. Returns the number of lines merged.
    pub async fn merge(&self, user_id: &str, lines: &[(String, i64)]) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut merged = 0;

        for (product_id, quantity) in lines {
            if *quantity < 1 {
                continue;
            }

            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                debug!(product_id = %product_id, "Skipping merge of unknown product");
                continue;
            }

            sqlx::query(UPSERT_ADD)
                .bind(Uuid::new_v4().to_string())
                .bind(user_id)
                .bind(product_id)
                .bind(*quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            merged += 1;
        }

        tx.commit().await?;

        info!(user_id = %user_id, merged, "Merged local cart into remote cart");
        Ok(merged)
    }

    /// Number of rows in the user's cart.
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::fixtures;
    use medmart_core::UserRole;

    #[tokio::test]
    async fn test_add_increments_existing_row() {
        let db = fixtures::db().await;
        let buyer = fixtures::user(&db, "buyer@clinic.org", UserRole::Buyer).await;
        let supplier = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        let p1 = fixtures::product(&db, &supplier.id, "P1", 100, 50).await;

        let carts = db.carts();
        carts.add(&buyer.id, &p1.id, 2).await.unwrap();
        carts.add(&buyer.id, &p1.id, 3).await.unwrap();

        let items = carts.items(&buyer.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[0].product.id, p1.id);
        assert_eq!(items[0].line_total().cents(), 500);
    }

    #[tokio::test]
    async fn test_add_saturates_at_i64_max() {
        let db = fixtures::db().await;
        let buyer = fixtures::user(&db, "buyer@clinic.org", UserRole::Buyer).await;
        let supplier = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        let p1 = fixtures::product(&db, &supplier.id, "P1", 100, 50).await;

        let carts = db.carts();
        carts.add(&buyer.id, &p1.id, i64::MAX - 1).await.unwrap();
        carts.add(&buyer.id, &p1.id, 5).await.unwrap();
        carts.merge(&buyer.id, &[(p1.id.clone(), i64::MAX)]).await.unwrap();

        let items = carts.items(&buyer.id).await.unwrap();
        assert_eq!(items[0].quantity, i64::MAX);
        assert_eq!(items[0].line_total().cents(), i64::MAX);
    }

    #[tokio::test]
    async fn test_set_quantity_and_remove() {
        let db = fixtures::db().await;
        let buyer = fixtures::user(&db, "buyer@clinic.org", UserRole::Buyer).await;
        let supplier = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        let p1 = fixtures::product(&db, &supplier.id, "P1", 100, 50).await;
        let p2 = fixtures::product(&db, &supplier.id, "P2", 250, 50).await;

        let carts = db.carts();
        carts.add(&buyer.id, &p1.id, 1).await.unwrap();
        carts.add(&buyer.id, &p2.id, 1).await.unwrap();

        assert!(carts.set_quantity(&buyer.id, &p1.id, 7).await.unwrap());
        assert!(!carts.set_quantity(&buyer.id, "missing", 7).await.unwrap());

        // Zero deletes the row
        assert!(carts.set_quantity(&buyer.id, &p2.id, 0).await.unwrap());
        assert!(!carts.remove(&buyer.id, &p2.id).await.unwrap());

        let items = carts.items(&buyer.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_clear_leaves_zero_rows() {
        let db = fixtures::db().await;
        let buyer = fixtures::user(&db, "buyer@clinic.org", UserRole::Buyer).await;
        let other = fixtures::user(&db, "other@clinic.org", UserRole::Buyer).await;
        let supplier = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        let p1 = fixtures::product(&db, &supplier.id, "P1", 100, 50).await;

        let carts = db.carts();
        carts.add(&buyer.id, &p1.id, 1).await.unwrap();
        carts.add(&other.id, &p1.id, 1).await.unwrap();

        assert_eq!(carts.clear(&buyer.id).await.unwrap(), 1);
        assert_eq!(carts.count(&buyer.id).await.unwrap(), 0);
        assert_eq!(carts.count(&other.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_unions_lines() {
        let db = fixtures::db().await;
        let buyer = fixtures::user(&db, "buyer@clinic.org", UserRole::Buyer).await;
        let supplier = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        let p1 = fixtures::product(&db, &supplier.id, "P1", 100, 50).await;
        let p2 = fixtures::product(&db, &supplier.id, "P2", 200, 50).await;

        let carts = db.carts();
        carts.add(&buyer.id, &p1.id, 1).await.unwrap();

        let merged = carts
            .merge(
                &buyer.id,
                &[
                    (p1.id.clone(), 2),
                    (p2.id.clone(), 4),
                    ("gone".to_string(), 1),
                ],
            )
            .await
            .unwrap();
        assert_eq!(merged, 2);

        let items = carts.items(&buyer.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product.id, p1.id);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[1].quantity, 4);
    }
}
