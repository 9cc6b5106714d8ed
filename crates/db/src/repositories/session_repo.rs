//! Repository for the `sessions` table.

use async_trait::async_trait;
use passgate_core::types::{Timestamp, UserId};
use uuid::Uuid;

use super::SessionRepository;
use crate::models::session::{CreateSession, Session};
use crate::{DbPool, StoreError};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, session_token, device_info, is_active, \
                       expires_at, last_accessed_at, created_at";

/// PostgreSQL implementation of [`SessionRepository`].
pub struct SessionRepo {
    pool: DbPool,
}

impl SessionRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SessionRepo {
    async fn create(&self, input: &CreateSession) -> Result<Session, StoreError> {
        let query = format!(
            "INSERT INTO sessions (id, user_id, session_token, device_info, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(Uuid::new_v4())
            .bind(input.user_id)
            .bind(&input.session_token)
            .bind(&input.device_info)
            .bind(input.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_active_by_token(
        &self,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE session_token = $1
               AND is_active = true
               AND expires_at > $2"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE session_token = $1");
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE sessions SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_all_for_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false
             WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
