//! Opaque bearer sessions.
//!
//! A session is usable iff it is active and unexpired. There is no sliding
//! renewal: the expiry set at creation is final, so validation never writes.

use std::sync::Arc;

use chrono::{Duration, Utc};
use passgate_core::error::CoreError;
use passgate_core::types::UserId;
use passgate_db::models::session::{CreateSession, Session};
use passgate_db::repositories::SessionRepository;
use passgate_db::StoreError;
use uuid::Uuid;

/// Lifetime of every session.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Session revoked")]
    Revoked,

    #[error("Session persistence failed: {0}")]
    PersistenceFailed(#[from] StoreError),
}

impl From<SessionError> for CoreError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound | SessionError::Expired | SessionError::Revoked => {
                CoreError::Unauthorized
            }
            SessionError::PersistenceFailed(e) => CoreError::Internal(e.to_string()),
        }
    }
}

/// Creates, validates and revokes sessions.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            ttl: Duration::hours(SESSION_TTL_HOURS),
        }
    }

    /// Override the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Start a new session for an already-authenticated user.
    pub async fn create(&self, user_id: UserId, device_info: &str) -> Result<Session, SessionError> {
        let input = CreateSession {
            user_id,
            session_token: Uuid::new_v4().to_string(),
            device_info: device_info.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        let session = self.sessions.create(&input).await?;
        tracing::info!(user_id = %user_id, session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Resolve `token` to a usable session.
    ///
    /// The store applies the full predicate in one read. On a miss the token is
    /// looked up again unfiltered purely to log why it failed; callers see
    /// [`SessionError::NotFound`], [`SessionError::Revoked`] or
    /// [`SessionError::Expired`], all of which map to the same unauthorized
    /// outcome.
    pub async fn validate(&self, token: &str) -> Result<Session, SessionError> {
        let now = Utc::now();
        if let Some(session) = self.sessions.find_active_by_token(token, now).await? {
            return Ok(session);
        }

        let reason = match self.sessions.find_by_token(token).await? {
            None => SessionError::NotFound,
            Some(s) if !s.is_active => SessionError::Revoked,
            Some(_) => SessionError::Expired,
        };
        tracing::debug!(reason = %reason, "Session validation failed");
        Err(reason)
    }

    /// Deactivate the session holding `token`, whatever its current state.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .find_by_token(token)
            .await?
            .ok_or(SessionError::NotFound)?;
        self.sessions.deactivate(session.id).await?;
        tracing::info!(user_id = %session.user_id, session_id = %session.id, "Session revoked");
        Ok(())
    }

    /// Deactivate every session owned by `user_id`. Returns how many were revoked.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, SessionError> {
        let revoked = self.sessions.deactivate_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }
}
