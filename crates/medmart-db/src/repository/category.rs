//! # Category Repository
//!
//! Read-mostly access to product categories.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use medmart_core::Category;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, slug, name, description FROM categories ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, slug, name, description FROM categories WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, slug, name, description FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a category. Slugs are unique.
    pub async fn insert(&self, slug: &str, name: &str, description: Option<&str>) -> DbResult<Category> {
        let id = Uuid::new_v4().to_string();
        debug!(slug = %slug, "Inserting category");

        sqlx::query("INSERT INTO categories (id, slug, name, description) VALUES (?1, ?2, ?3, ?4)")
            .bind(&id)
            .bind(slug)
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("slug", slug),
                other => other,
            })?;

        Ok(Category {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = fixtures::db().await;
        let repo = db.categories();

        repo.insert("wound-care", "Wound Care", None).await.unwrap();
        let ppe = repo.insert("ppe", "Protective Equipment", Some("Gloves, masks")).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].slug, "ppe");

        assert_eq!(repo.get_by_slug("ppe").await.unwrap().unwrap().id, ppe.id);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());

        let err = repo.insert("ppe", "Again", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
