//! Repository for the `tokens` table.

use async_trait::async_trait;
use uuid::Uuid;

use super::TokenRepository;
use crate::models::token::{CreatePurposeToken, PurposeToken};
use crate::{DbPool, StoreError};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token, purpose, used, expires_at, created_at";

/// PostgreSQL implementation of [`TokenRepository`].
pub struct TokenRepo {
    pool: DbPool,
}

impl TokenRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for TokenRepo {
    async fn create(&self, input: &CreatePurposeToken) -> Result<PurposeToken, StoreError> {
        let query = format!(
            "INSERT INTO tokens (id, user_id, token, purpose, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let token = sqlx::query_as::<_, PurposeToken>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.user_id)
            .bind(&input.token)
            .bind(input.purpose.as_str())
            .bind(input.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PurposeToken>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM tokens WHERE token = $1");
        let row = sqlx::query_as::<_, PurposeToken>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn mark_used(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE tokens SET used = true WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
