//! Repository traits for the three persisted entities and their PostgreSQL
//! implementations.
//!
//! The auth core only ever talks to the traits, so tests and local
//! development can swap in [`crate::MemoryStore`].

mod session_repo;
mod token_repo;
mod user_repo;

use std::sync::Arc;

use async_trait::async_trait;
use passgate_core::types::{Timestamp, UserId};
use uuid::Uuid;

use crate::memory::MemoryStore;
use crate::models::session::{CreateSession, Session};
use crate::models::token::{CreatePurposeToken, PurposeToken};
use crate::models::user::{CreateUser, User};
use crate::{DbPool, StoreError};

pub use session_repo::SessionRepo;
pub use token_repo::TokenRepo;
pub use user_repo::UserRepo;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::UniqueViolation`] if the
    /// email is taken.
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Exact, case-sensitive match.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replace the password hash. Returns `false` if no such user exists.
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, input: &CreateSession) -> Result<Session, StoreError>;

    /// Fetch the session matching `token` that is active and unexpired at `now`.
    ///
    /// The whole predicate is evaluated by the store in one read so a
    /// concurrently revoked or expired row is never returned.
    async fn find_active_by_token(
        &self,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError>;

    /// Fetch the session matching `token` regardless of state.
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Set `is_active = false`. Returns `false` if no such session exists.
    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Deactivate every active session owned by `user_id` in one statement.
    /// Returns the number of sessions revoked.
    async fn deactivate_all_for_user(&self, user_id: UserId) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, input: &CreatePurposeToken) -> Result<PurposeToken, StoreError>;

    /// Fetch by token string regardless of purpose, expiry or use.
    async fn find_by_token(&self, token: &str) -> Result<Option<PurposeToken>, StoreError>;

    /// Idempotently set `used = true`. Returns `false` if no such token exists.
    async fn mark_used(&self, token: &str) -> Result<bool, StoreError>;
}

/// The set of repositories a running service needs.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub tokens: Arc<dyn TokenRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            users: Arc::new(UserRepo::new(pool.clone())),
            sessions: Arc::new(SessionRepo::new(pool.clone())),
            tokens: Arc::new(TokenRepo::new(pool)),
        }
    }

    /// Repositories backed by a single shared [`MemoryStore`].
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            sessions: store.clone(),
            tokens: store,
        }
    }
}
