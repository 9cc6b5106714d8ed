//! Session model and DTOs.

use passgate_core::types::{Timestamp, UserId};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `sessions` table.
///
/// Rows are never updated in place except to flip `is_active` off.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: UserId,
    /// The bearer credential handed to the client.
    pub session_token: String,
    /// User agent (or other device label) the session was created from.
    pub device_info: String,
    pub is_active: bool,
    pub expires_at: Timestamp,
    pub last_accessed_at: Timestamp,
    pub created_at: Timestamp,
}

impl Session {
    /// A session is usable iff it is active and `now` is strictly before expiry.
    pub fn is_usable_at(&self, now: Timestamp) -> bool {
        self.is_active && now < self.expires_at
    }
}

/// DTO for creating a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: UserId,
    pub session_token: String,
    pub device_info: String,
    pub expires_at: Timestamp,
}
