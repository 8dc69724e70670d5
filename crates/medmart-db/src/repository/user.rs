//! # User Repository
//!
//! Accounts, credentials, avatars and the public supplier directory.
//!
//! The password hash lives only in [`UserRecord`]; every other query returns
//! the public [`User`] profile.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use medmart_core::{Supplier, User, UserRole};

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = r#"
    id, email, full_name, role, company_name,
    avatar IS NOT NULL AS has_avatar,
    created_at
"#;

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Already validated and lowercased.
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub company_name: Option<String>,
}

/// A user together with the stored credential, for login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on `email` if it is already registered.
    pub async fn create(&self, new: &NewUser) -> DbResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, role = %new.role, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, role, company_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(new.role)
        .bind(&new.company_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &new.email),
            other => other,
        })?;

        info!(id = %id, role = %new.role, "User created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &id))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Looks up login credentials by (lowercased) email.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<UserRecord>> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE email = ?1",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Updates the editable profile fields.
    pub async fn update_profile(
        &self,
        id: &str,
        full_name: &str,
        company_name: Option<&str>,
    ) -> DbResult<User> {
        debug!(id = %id, "Updating profile");

        let result = sqlx::query("UPDATE users SET full_name = ?2, company_name = ?3 WHERE id = ?1")
            .bind(id)
            .bind(full_name)
            .bind(company_name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Changes an account's role (admin only at the API layer).
    pub async fn set_role(&self, id: &str, role: UserRole) -> DbResult<()> {
        info!(id = %id, role = %role, "Changing user role");

        let result = sqlx::query("UPDATE users SET role = ?2 WHERE id = ?1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Lists accounts, newest first, optionally restricted to one role.
    pub async fn list(&self, role: Option<UserRole>) -> DbResult<Vec<User>> {
        let users = match role {
            Some(role) => {
                let sql = format!(
                    "SELECT {} FROM users WHERE role = ?1 ORDER BY created_at DESC, id",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, User>(&sql)
                    .bind(role)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM users ORDER BY created_at DESC, id", USER_COLUMNS);
                sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?
            }
        };

        Ok(users)
    }

    /// Public supplier directory with active listing counts.
    pub async fn suppliers(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT
                u.id,
                COALESCE(u.company_name, u.full_name) AS company_name,
                COUNT(p.id) AS product_count
            FROM users u
            LEFT JOIN products p ON p.supplier_id = u.id AND p.is_active = 1
            WHERE u.role = 'supplier'
            GROUP BY u.id
            ORDER BY company_name COLLATE NOCASE, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    // -------------------------------------------------------------------------
    // Avatars
    // -------------------------------------------------------------------------

    /// Stores (or replaces) the avatar image.
    pub async fn set_avatar(&self, id: &str, bytes: &[u8], content_type: &str) -> DbResult<()> {
        debug!(id = %id, size = bytes.len(), content_type = %content_type, "Storing avatar");

        let result = sqlx::query("UPDATE users SET avatar = ?2, avatar_content_type = ?3 WHERE id = ?1")
            .bind(id)
            .bind(bytes)
            .bind(content_type)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Returns `(bytes, content_type)` if the user has an avatar.
    pub async fn get_avatar(&self, id: &str) -> DbResult<Option<(Vec<u8>, String)>> {
        let row: Option<(Option<Vec<u8>>, Option<String>)> =
            sqlx::query_as("SELECT avatar, avatar_content_type FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match row {
            Some((Some(bytes), content_type)) => Some((
                bytes,
                content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            )),
            _ => None,
        })
    }

    /// Removes the avatar. Returns whether one was present.
    pub async fn clear_avatar(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET avatar = NULL, avatar_content_type = NULL WHERE id = ?1 AND avatar IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
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
    use super::*;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "nurse@clinic.org", UserRole::Buyer).await;

        assert_eq!(user.email, "nurse@clinic.org");
        assert_eq!(user.role, UserRole::Buyer);
        assert!(!user.has_avatar);

        let fetched = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);

        let creds = db.users().find_credentials("nurse@clinic.org").await.unwrap().unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "not-a-real-hash");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = fixtures::db().await;
        fixtures::user(&db, "dup@clinic.org", UserRole::Buyer).await;

        let err = db
            .users()
            .create(&NewUser {
                email: "dup@clinic.org".to_string(),
                password_hash: "x".to_string(),
                full_name: "Again".to_string(),
                role: UserRole::Buyer,
                company_name: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_avatar_lifecycle() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "face@clinic.org", UserRole::Buyer).await;
        let repo = db.users();

        assert!(repo.get_avatar(&user.id).await.unwrap().is_none());

        repo.set_avatar(&user.id, &[0x89, 0x50, 0x4e, 0x47], "image/png").await.unwrap();
        let (bytes, content_type) = repo.get_avatar(&user.id).await.unwrap().unwrap();
        assert_eq!(bytes.len(), 4);
        assert_eq!(content_type, "image/png");
        assert!(repo.get_by_id(&user.id).await.unwrap().unwrap().has_avatar);

        assert!(repo.clear_avatar(&user.id).await.unwrap());
        assert!(!repo.clear_avatar(&user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_suppliers_count_active_products() {
        let db = fixtures::db().await;
        let supplier = fixtures::user(&db, "acme@supply.com", UserRole::Supplier).await;
        fixtures::user(&db, "buyer@clinic.org", UserRole::Buyer).await;

        fixtures::product(&db, &supplier.id, "GLV-1", 1000, 5).await;
        let delisted = fixtures::product(&db, &supplier.id, "GLV-2", 1000, 5).await;
        db.products().set_active(&delisted.id, false).await.unwrap();

        let suppliers = db.users().suppliers().await.unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].id, supplier.id);
        assert_eq!(suppliers[0].product_count, 1);
    }

    #[tokio::test]
    async fn test_list_by_role_and_set_role() {
        let db = fixtures::db().await;
        let a = fixtures::user(&db, "a@clinic.org", UserRole::Buyer).await;
        fixtures::user(&db, "b@supply.com", UserRole::Supplier).await;

        assert_eq!(db.users().list(None).await.unwrap().len(), 2);
        assert_eq!(db.users().list(Some(UserRole::Buyer)).await.unwrap().len(), 1);

        db.users().set_role(&a.id, UserRole::Admin).await.unwrap();
        assert_eq!(db.users().list(Some(UserRole::Admin)).await.unwrap()[0].id, a.id);
        assert!(db.users().set_role("missing", UserRole::Admin).await.unwrap_err().is_not_found());
    }
}
