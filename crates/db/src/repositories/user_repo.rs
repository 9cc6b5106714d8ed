//! Repository for the `users` table.

use async_trait::async_trait;
use passgate_core::types::UserId;
use uuid::Uuid;

use super::UserRepository;
use crate::models::user::{CreateUser, User};
use crate::{DbPool, StoreError};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, name, created_at, updated_at";

/// PostgreSQL implementation of [`UserRepository`].
pub struct UserRepo {
    pool: DbPool,
}

impl UserRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepo {
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, email, password_hash, name)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
