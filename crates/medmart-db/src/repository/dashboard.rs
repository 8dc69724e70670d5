//! # Dashboard Repository
//!
//! Read-only aggregates for the three role dashboards.
//! Cancelled orders are excluded from every revenue and spend figure.

use sqlx::SqlitePool;
use tracing::debug;

use medmart_core::{AdminStats, BuyerDashboard, Product, SupplierDashboard, LOW_STOCK_THRESHOLD};

use crate::error::DbResult;
use crate::repository::order::OrderRepository;
use crate::repository::product::PRODUCT_COLUMNS;

const RECENT_ORDERS: u32 = 5;

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Marketplace-wide counters.
    pub async fn admin_stats(&self) -> DbResult<AdminStats> {
        let (total_users, buyers, suppliers, admins): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(role = 'buyer'), 0),
                COALESCE(SUM(role = 'supplier'), 0),
                COALESCE(SUM(role = 'admin'), 0)
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (total_products, active_products): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM products")
                .fetch_one(&self.pool)
                .await?;

        let (total_orders, pending_orders, revenue_cents): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(CASE WHEN status != 'cancelled' THEN total_cents ELSE 0 END), 0)
            FROM orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        debug!(total_users, total_products, total_orders, "Computed admin stats");

        Ok(AdminStats {
            total_users,
            buyers,
            suppliers,
            admins,
            total_products,
            active_products,
            total_orders,
            pending_orders,
            revenue_cents,
        })
    }

    pub async fn buyer(&self, user_id: &str) -> DbResult<BuyerDashboard> {
        let (order_count, total_spent_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status != 'cancelled' THEN total_cents ELSE 0 END), 0)
            FROM orders
            WHERE buyer_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let recent_orders = OrderRepository::new(self.pool.clone())
            .list_for_buyer(user_id, RECENT_ORDERS)
            .await?;

        let unread_notifications: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(BuyerDashboard {
            order_count,
            total_spent_cents,
            recent_orders,
            unread_notifications,
        })
    }

    pub async fn supplier(&self, supplier_id: &str) -> DbResult<SupplierDashboard> {
        let (product_count, active_product_count): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM products WHERE supplier_id = ?1",
        )
        .bind(supplier_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM products p
            WHERE p.supplier_id = ?1 AND p.is_active = 1 AND p.stock <= ?2
            ORDER BY p.stock, p.name COLLATE NOCASE
            "#,
            PRODUCT_COLUMNS
        );
        let low_stock = sqlx::query_as::<_, Product>(&sql)
            .bind(supplier_id)
            .bind(LOW_STOCK_THRESHOLD)
            .fetch_all(&self.pool)
            .await?;

        let (units_sold, revenue_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(i.quantity), 0), COALESCE(SUM(i.line_total_cents), 0)
            FROM order_items i
            INNER JOIN orders o ON o.id = i.order_id
            WHERE i.supplier_id = ?1 AND o.status != 'cancelled'
            "#,
        )
        .bind(supplier_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SupplierDashboard {
            product_count,
            active_product_count,
            low_stock,
            units_sold,
            revenue_cents,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
