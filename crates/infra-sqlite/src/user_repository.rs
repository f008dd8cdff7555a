// SQLite UserRepository Implementation

use crate::error::{corrupt_row, map_sqlx_error};
use async_trait::async_trait;
use queuedesk_core::domain::{Role, UserId, UserProfile};
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::UserRepository;
use sqlx::SqlitePool;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, role, name, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.role.map(|r| r.to_string()))
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("email {} is already registered", user.email))
            }
            other => other,
        })?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        // email column is COLLATE NOCASE
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(UserRow::into_profile).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(UserRow::into_profile).transpose()
    }
}

// SQLx row mapping
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    role: Option<String>,
    name: String,
    password_hash: String,
    created_at: i64,
}

impl UserRow {
    fn into_profile(self) -> Result<UserProfile> {
        let role = self
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(|e| corrupt_row("users", &self.id, e))?;

        Ok(UserProfile {
            id: self.id,
            email: self.email,
            name: self.name,
            role,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    async fn setup_repo() -> SqliteUserRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteUserRepository::new(pool)
    }

    fn user(id: &str, email: &str, role: Option<Role>) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            email: email.to_string(),
            name: "Alan".to_string(),
            role,
            password_hash: "hash".to_string(),
            created_at: 1,
        }
    }

    #[tokio::test]
    async fn test_find_by_email_ignores_case() {
        let repo = setup_repo().await;
        repo.insert(&user("u1", "alan@uni.edu", Some(Role::Admin)))
            .await
            .unwrap();

        let found = repo.find_by_email("Alan@Uni.EDU").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(found.is_admin());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = setup_repo().await;
        repo.insert(&user("u1", "alan@uni.edu", None)).await.unwrap();

        let err = repo
            .insert(&user("u2", "ALAN@uni.edu", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_role_is_optional() {
        let repo = setup_repo().await;
        repo.insert(&user("u1", "plain@uni.edu", None)).await.unwrap();

        let found = repo.find_by_id(&"u1".to_string()).await.unwrap().unwrap();
        assert_eq!(found.role, None);
        assert!(!found.is_admin());
    }
}
