//! In-memory implementation of every repository trait.
//!
//! Honours the same predicates and uniqueness rules as the PostgreSQL
//! repositories. Not suitable for multi-instance deployments: state lives in
//! one process and is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use passgate_core::types::{Timestamp, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::session::{CreateSession, Session};
use crate::models::token::{CreatePurposeToken, PurposeToken};
use crate::models::user::{CreateUser, User};
use crate::repositories::{SessionRepository, TokenRepository, UserRepository};
use crate::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    sessions: RwLock<HashMap<Uuid, Session>>,
    tokens: RwLock<HashMap<String, PurposeToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session row as-is. Lets callers seed already-expired or
    /// revoked rows.
    pub async fn insert_session(&self, session: Session) {
        self.sessions.write().await.insert(session.id, session);
    }

    /// Insert a token row as-is.
    pub async fn insert_token(&self, token: PurposeToken) {
        self.tokens.write().await.insert(token.token.clone(), token);
    }

    /// All tokens owned by `user_id`, oldest first.
    pub async fn tokens_for_user(&self, user_id: &str) -> Vec<PurposeToken> {
        let mut rows: Vec<_> = self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.created_at);
        rows
    }

    /// All sessions owned by `user_id`, oldest first.
    pub async fn sessions_for_user(&self, user_id: UserId) -> Vec<Session> {
        let mut rows: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.created_at);
        rows
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == input.email) {
            return Err(StoreError::UniqueViolation("uq_users_email".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            name: input.name.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = Some(password_hash.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, input: &CreateSession) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions
            .values()
            .any(|s| s.session_token == input.session_token)
        {
            return Err(StoreError::UniqueViolation(
                "uq_sessions_session_token".into(),
            ));
        }
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            session_token: input.session_token.clone(),
            device_info: input.device_info.clone(),
            is_active: true,
            expires_at: input.expires_at,
            last_accessed_at: now,
            created_at: now,
        };
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_active_by_token(
        &self,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| s.session_token == token && s.is_usable_at(now))
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| s.session_token == token)
            .cloned())
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(session) => {
                session.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_all_for_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for session in sessions
            .values_mut()
            .filter(|s| s.user_id == user_id && s.is_active)
        {
            session.is_active = false;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn create(&self, input: &CreatePurposeToken) -> Result<PurposeToken, StoreError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&input.token) {
            return Err(StoreError::UniqueViolation("uq_tokens_token".into()));
        }
        let row = PurposeToken {
            id: Uuid::new_v4(),
            user_id: input.user_id.clone(),
            token: input.token.clone(),
            purpose: input.purpose,
            used: false,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        tokens.insert(row.token.clone(), row.clone());
        Ok(row)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PurposeToken>, StoreError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn mark_used(&self, token: &str) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            Some(row) => {
                row.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
