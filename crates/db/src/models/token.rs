//! Single-use purpose token model and DTOs.

use std::fmt;

use passgate_core::types::Timestamp;
use sqlx::FromRow;
use uuid::Uuid;

/// The one action a purpose token may be redeemed for.
///
/// Purposes never share a namespace: a reset token cannot complete a
/// magic-link login and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    Reset,
    MagicLink,
}

impl TokenPurpose {
    /// Tag stored in the `tokens.purpose` column.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::Reset => "reset",
            TokenPurpose::MagicLink => "magic_link",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored purpose tag that matches no known [`TokenPurpose`].
#[derive(Debug, thiserror::Error)]
#[error("Unknown token purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl TryFrom<String> for TokenPurpose {
    type Error = UnknownPurpose;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "reset" => Ok(TokenPurpose::Reset),
            "magic_link" => Ok(TokenPurpose::MagicLink),
            _ => Err(UnknownPurpose(value)),
        }
    }
}

/// A row from the `tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct PurposeToken {
    pub id: Uuid,
    /// Owner id kept as an opaque string, not a foreign key.
    pub user_id: String,
    pub token: String,
    #[sqlx(try_from = "String")]
    pub purpose: TokenPurpose,
    pub used: bool,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for persisting a freshly issued token.
#[derive(Debug, Clone)]
pub struct CreatePurposeToken {
    pub user_id: String,
    pub token: String,
    pub purpose: TokenPurpose,
    pub expires_at: Timestamp,
}
