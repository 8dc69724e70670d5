//! # Order Repository
//!
//! Order placement and history.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── for each line: load product, check listed + stock                │
//! │   ├── subtotal = Σ current price × qty, shipping = policy(subtotal)    │
//! │   ├── INSERT orders                                                     │
//! │   ├── INSERT order_items (sku / name / price snapshots)                │
//! │   ├── UPDATE products SET stock = stock - qty WHERE stock >= qty       │
//! │   ├── INSERT notifications (each supplier + the buyer)                 │
//! │   └── INSERT activity_log (order_placed)                               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure rolls the whole order back; the buyer's cart is untouched.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use medmart_core::checkout::{PaymentSummary, ShippingAddress, ShippingPolicy};
use medmart_core::{ActivityKind, Money, Order, OrderItem, OrderStatus, OrderWithItems, Product};

use crate::error::{DbError, DbResult};
use crate::repository::activity::record_on;
use crate::repository::notification::insert_on;
use crate::repository::product::PRODUCT_COLUMNS;

const ORDER_COLUMNS: &str = r#"
    o.id, o.order_number, o.buyer_id, o.status, o.subtotal_cents, o.shipping_cents, o.total_cents,
    o.ship_name, o.ship_line1, o.ship_line2, o.ship_city, o.ship_region, o.ship_postal_code,
    o.ship_country, o.payment_brand, o.payment_last4, o.created_at
"#;

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: String,
    pub address: ShippingAddress,
    pub payment: PaymentSummary,
    /// `(product_id, quantity)` per cart line.
    pub lines: Vec<(String, i64)>,
    pub shipping: ShippingPolicy,
}

fn order_number(now: chrono::DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("MM-{}-{}", now.format("%Y%m%d"), suffix)
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order in a single transaction.
    ///
    /// Prices come from the product rows at placement time, not from the
    /// caller, so a stale cart cannot under-pay.
    ///
    /// ## Errors
    /// - `EmptyOrder` if `lines` is empty
    /// - `NotFound` if a product no longer exists
    /// - `ProductUnavailable` if a product was delisted
    /// - `InsufficientStock` if a line asks for more than is in stock
    pub async fn place(&self, new: &NewOrder) -> DbResult<OrderWithItems> {
        if new.lines.is_empty() {
            return Err(DbError::EmptyOrder);
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let number = order_number(now);

        debug!(order_id = %order_id, buyer_id = %new.buyer_id, lines = new.lines.len(), "Placing order");

        let mut tx = self.pool.begin().await?;

        // 1. Load and check every line against current product rows
        let product_sql = format!("SELECT {} FROM products p WHERE p.id = ?1", PRODUCT_COLUMNS);
        let mut items = Vec::with_capacity(new.lines.len());
        for (product_id, quantity) in &new.lines {
            let product = sqlx::query_as::<_, Product>(&product_sql)
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Product", product_id))?;

            if !product.is_active {
                return Err(DbError::ProductUnavailable(product.sku));
            }
            if product.stock < *quantity {
                warn!(sku = %product.sku, available = product.stock, requested = quantity, "Insufficient stock");
                return Err(DbError::InsufficientStock {
                    sku: product.sku,
                    available: product.stock,
                    requested: *quantity,
                });
            }

            let line_total = product.price().multiply_quantity(*quantity);
            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: product.id,
                supplier_id: product.supplier_id,
                sku_snapshot: product.sku,
                name_snapshot: product.name,
                unit_price_cents: product.price_cents,
                quantity: *quantity,
                line_total_cents: line_total.cents(),
            });
        }

        // 2. Totals
        let subtotal: Money = items.iter().map(|i| Money::from_cents(i.line_total_cents)).sum();
        let shipping = new.shipping.shipping_for(subtotal);
        let total = subtotal + shipping;

        let order = Order {
            id: order_id.clone(),
            order_number: number.clone(),
            buyer_id: new.buyer_id.clone(),
            status: OrderStatus::Pending,
            subtotal_cents: subtotal.cents(),
            shipping_cents: shipping.cents(),
            total_cents: total.cents(),
            ship_name: new.address.full_name.clone(),
            ship_line1: new.address.line1.clone(),
            ship_line2: new.address.line2.clone(),
            ship_city: new.address.city.clone(),
            ship_region: new.address.region.clone(),
            ship_postal_code: new.address.postal_code.clone(),
            ship_country: new.address.country.clone(),
            payment_brand: new.payment.brand.to_string(),
            payment_last4: new.payment.last4.clone(),
            created_at: now,
        };

        // 3. Order row
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, buyer_id, status, subtotal_cents, shipping_cents, total_cents,
                ship_name, ship_line1, ship_line2, ship_city, ship_region, ship_postal_code,
                ship_country, payment_brand, payment_last4, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.buyer_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(&order.ship_name)
        .bind(&order.ship_line1)
        .bind(&order.ship_line2)
        .bind(&order.ship_city)
        .bind(&order.ship_region)
        .bind(&order.ship_postal_code)
        .bind(&order.ship_country)
        .bind(&order.payment_brand)
        .bind(&order.payment_last4)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        // 4. Line items + stock decrement
        let mut units_by_supplier: BTreeMap<&str, i64> = BTreeMap::new();
        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, supplier_id, sku_snapshot, name_snapshot,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.supplier_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1 AND stock >= ?2",
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            // Same product listed twice in `lines`
            if result.rows_affected() == 0 {
                return Err(DbError::InsufficientStock {
                    sku: item.sku_snapshot.clone(),
                    available: 0,
                    requested: item.quantity,
                });
            }

            *units_by_supplier.entry(item.supplier_id.as_str()).or_default() += item.quantity;
        }

        // 5. Notifications
        for (supplier_id, units) in &units_by_supplier {
            insert_on(
                &mut tx,
                supplier_id,
                &format!("New order {}", number),
                &format!("{} unit(s) of your products were ordered.", units),
            )
            .await?;
        }
        insert_on(
            &mut tx,
            &new.buyer_id,
            &format!("Order {} placed", number),
            &format!("Thank you for your order. Total charged: {}.", total),
        )
        .await?;

        // 6. Activity feed
        record_on(
            &mut tx,
            Some(&new.buyer_id),
            ActivityKind::OrderPlaced,
            &format!("Order {} placed for {}", number, total),
        )
        .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_cents = order.total_cents,
            "Order placed"
        );

        Ok(OrderWithItems { order, items })
    }

    /// Loads an order with its lines.
    pub async fn get(&self, order_id: &str) -> DbResult<Option<OrderWithItems>> {
        let sql = format!("SELECT {} FROM orders o WHERE o.id = ?1", ORDER_COLUMNS);
        let Some(order) = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let items = self.items(order_id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, supplier_id, sku_snapshot, name_snapshot,
                   unit_price_cents, quantity, line_total_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// A buyer's orders, newest first.
    pub async fn list_for_buyer(&self, buyer_id: &str, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders o WHERE o.buyer_id = ?1 ORDER BY o.created_at DESC, o.rowid DESC LIMIT ?2",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(buyer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Orders containing at least one of the supplier's products.
    pub async fn list_for_supplier(&self, supplier_id: &str, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM orders o
            WHERE EXISTS (
                SELECT 1 FROM order_items i WHERE i.order_id = o.id AND i.supplier_id = ?1
            )
            ORDER BY o.created_at DESC, o.rowid DESC
            LIMIT ?2
            "#,
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(supplier_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// All orders, newest first (admin).
    pub async fn list_all(&self, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders o ORDER BY o.created_at DESC, o.rowid DESC LIMIT ?1",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> DbResult<()> {
        info!(order_id = %order_id, status = ?status, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
