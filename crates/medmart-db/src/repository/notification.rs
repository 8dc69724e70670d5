//! # Notification Repository
//!
//! In-app notifications: new-order alerts for suppliers, confirmations for
//! buyers.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use medmart_core::Notification;

use crate::error::DbResult;

/// Inserts a notification on an existing connection (used inside the order
/// transaction).
pub(crate) async fn insert_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    title: &str,
    body: &str,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO notifications (id, user_id, title, body, is_read, created_at) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(body)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(id)
}

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    pub async fn create(&self, user_id: &str, title: &str, body: &str) -> DbResult<String> {
        debug!(user_id = %user_id, title = %title, "Creating notification");
        let mut conn = self.pool.acquire().await?;
        insert_on(&mut conn, user_id, title, body).await
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(&self, user_id: &str, unread_only: bool, limit: u32) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, body, is_read, created_at
            FROM notifications
            WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks one notification read. Scoped to its owner; returns whether a
    /// row matched.
    pub async fn mark_read(&self, id: &str, user_id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> DbResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
