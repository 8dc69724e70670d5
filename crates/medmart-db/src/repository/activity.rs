//! # Activity Repository
//!
//! The admin "recent activity" feed: sign-ups, listings, orders.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use medmart_core::{ActivityEntry, ActivityKind};

use crate::error::DbResult;

pub(crate) async fn record_on(
    conn: &mut SqliteConnection,
    actor_id: Option<&str>,
    kind: ActivityKind,
    message: &str,
) -> DbResult<()> {
    sqlx::query("INSERT INTO activity_log (id, actor_id, kind, message, created_at) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(Uuid::new_v4().to_string())
        .bind(actor_id)
        .bind(kind)
        .bind(message)
        .bind(Utc::now())
        .execute(conn)
        .await?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    pub async fn record(&self, actor_id: Option<&str>, kind: ActivityKind, message: &str) -> DbResult<()> {
        debug!(actor_id = ?actor_id, kind = ?kind, "Recording activity");
        let mut conn = self.pool.acquire().await?;
        record_on(&mut conn, actor_id, kind, message).await
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, actor_id, kind, message, created_at
            FROM activity_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::fixtures;
    use medmart_core::{ActivityKind, UserRole};

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        let repo = db.activity();

        repo.record(Some(&user.id), ActivityKind::UserSignedUp, "acme signed up").await.unwrap();
        repo.record(Some(&user.id), ActivityKind::ProductListed, "acme listed GLV-1").await.unwrap();
        repo.record(None, ActivityKind::ProductDelisted, "GLV-0 delisted").await.unwrap();

        let recent = repo.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].kind, ActivityKind::ProductDelisted);
        assert_eq!(recent[0].actor_id, None);
        assert_eq!(recent[1].kind, ActivityKind::ProductListed);
    }
}
