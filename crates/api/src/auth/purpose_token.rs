//! Single-use, time-boxed tokens for password reset and magic-link login.
//!
//! Redemption and invalidation are deliberately separate calls: a token stays
//! redeemable until the action it authorizes has committed, and the caller
//! then invalidates it. Invalidation is best-effort, so two requests racing
//! on the same token inside that window may both succeed.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use passgate_core::error::CoreError;
use passgate_db::models::token::{CreatePurposeToken, PurposeToken, TokenPurpose};
use passgate_db::repositories::TokenRepository;
use passgate_db::StoreError;
use rand::RngCore;

/// Lifetime of every purpose token regardless of purpose.
pub const PURPOSE_TOKEN_TTL_MINS: i64 = 15;

/// Random bytes drawn per token before encoding.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,

    #[error("Token issued for {actual}, not {expected}")]
    WrongPurpose {
        expected: TokenPurpose,
        actual: TokenPurpose,
    },

    /// Past expiry or already used.
    #[error("Token expired or already used")]
    Expired,

    #[error("Token issuance failed: {0}")]
    IssuanceFailed(#[source] StoreError),

    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TokenError> for CoreError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound | TokenError::WrongPurpose { .. } | TokenError::Expired => {
                CoreError::TokenInvalid
            }
            TokenError::IssuanceFailed(_) | TokenError::Store(_) => {
                CoreError::Internal(err.to_string())
            }
        }
    }
}

/// Issues, redeems and invalidates purpose tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    tokens: Arc<dyn TokenRepository>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(tokens: Arc<dyn TokenRepository>) -> Self {
        Self {
            tokens,
            ttl: Duration::minutes(PURPOSE_TOKEN_TTL_MINS),
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Mint and persist a fresh token for `user_id`.
    ///
    /// `user_id` is stored as given; the issuer does not interpret it.
    pub async fn issue(&self, user_id: &str, purpose: TokenPurpose) -> Result<String, TokenError> {
        let token = generate_token();
        let input = CreatePurposeToken {
            user_id: user_id.to_string(),
            token: token.clone(),
            purpose,
            expires_at: Utc::now() + self.ttl,
        };
        self.tokens
            .create(&input)
            .await
            .map_err(TokenError::IssuanceFailed)?;

        tracing::debug!(user_id, %purpose, "Purpose token issued");
        Ok(token)
    }

    /// Check that `token` exists, was issued for `purpose`, is unused and unexpired.
    ///
    /// Does not consume the token; call [`TokenIssuer::invalidate`] once the
    /// dependent action has committed.
    pub async fn redeem(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<PurposeToken, TokenError> {
        let record = self
            .tokens
            .find_by_token(token)
            .await?
            .ok_or(TokenError::NotFound)?;

        if record.purpose != purpose {
            return Err(TokenError::WrongPurpose {
                expected: purpose,
                actual: record.purpose,
            });
        }
        if record.used || Utc::now() >= record.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(record)
    }

    /// Mark `token` used. Idempotent; an unknown token is not an error.
    pub async fn invalidate(&self, token: &str) -> Result<(), TokenError> {
        if !self.tokens.mark_used(token).await? {
            tracing::debug!("Invalidated token was not present in the store");
        }
        Ok(())
    }
}

/// 32 bytes from the thread-local CSPRNG, base64url without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use passgate_db::MemoryStore;

    fn issuer() -> (Arc<MemoryStore>, TokenIssuer) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), TokenIssuer::new(store))
    }

    #[test]
    fn generated_tokens_are_url_safe_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        // 32 bytes -> 43 base64 characters without padding.
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn issue_persists_unused_token_with_fifteen_minute_ttl() {
        let (store, issuer) = issuer();
        let before = Utc::now();
        let token = issuer.issue("user-1", TokenPurpose::Reset).await.unwrap();

        let stored = store.tokens_for_user("user-1").await;
        assert_eq!(stored.len(), 1);
        let record = &stored[0];
        assert_eq!(record.token, token);
        assert_eq!(record.purpose, TokenPurpose::Reset);
        assert!(!record.used);
        let ttl = record.expires_at - before;
        assert!(ttl <= Duration::minutes(15) + Duration::seconds(5));
        assert!(ttl >= Duration::minutes(15) - Duration::seconds(5));
    }

    #[tokio::test]
    async fn redeem_returns_record_without_consuming_it() {
        let (_store, issuer) = issuer();
        let token = issuer.issue("user-1", TokenPurpose::MagicLink).await.unwrap();

        let first = issuer.redeem(&token, TokenPurpose::MagicLink).await.unwrap();
        assert_eq!(first.user_id, "user-1");
        assert!(issuer.redeem(&token, TokenPurpose::MagicLink).await.is_ok());
    }

    #[tokio::test]
    async fn purposes_do_not_cross() {
        let (_store, issuer) = issuer();
        let reset = issuer.issue("u", TokenPurpose::Reset).await.unwrap();
        let magic = issuer.issue("u", TokenPurpose::MagicLink).await.unwrap();

        assert_matches!(
            issuer.redeem(&reset, TokenPurpose::MagicLink).await,
            Err(TokenError::WrongPurpose {
                expected: TokenPurpose::MagicLink,
                actual: TokenPurpose::Reset,
            })
        );
        assert_matches!(
            issuer.redeem(&magic, TokenPurpose::Reset).await,
            Err(TokenError::WrongPurpose { .. })
        );
    }

    #[tokio::test]
    async fn invalidated_token_cannot_be_redeemed_again() {
        let (_store, issuer) = issuer();
        let token = issuer.issue("u", TokenPurpose::Reset).await.unwrap();

        issuer.redeem(&token, TokenPurpose::Reset).await.unwrap();
        issuer.invalidate(&token).await.unwrap();
        assert_matches!(
            issuer.redeem(&token, TokenPurpose::Reset).await,
            Err(TokenError::Expired)
        );
        // Idempotent.
        issuer.invalidate(&token).await.unwrap();
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (_store, issuer) = issuer();
        let issuer = issuer.with_ttl(Duration::minutes(-1));
        let token = issuer.issue("u", TokenPurpose::Reset).await.unwrap();

        assert_matches!(
            issuer.redeem(&token, TokenPurpose::Reset).await,
            Err(TokenError::Expired)
        );
    }

    fn row(token: &str, issued_at: chrono::DateTime<Utc>, ttl: Duration) -> PurposeToken {
        PurposeToken {
            id: uuid::Uuid::new_v4(),
            user_id: "u".into(),
            token: token.into(),
            purpose: TokenPurpose::Reset,
            used: false,
            expires_at: issued_at + ttl,
            created_at: issued_at,
        }
    }

    #[tokio::test]
    async fn expiry_boundary_is_exclusive() {
        let (store, issuer) = issuer();
        let now = Utc::now();
        let ttl = Duration::minutes(PURPOSE_TOKEN_TTL_MINS);

        // Issued exactly one TTL ago: expires_at == issuance + 15 min <= now.
        store.insert_token(row("at-boundary", now - ttl, ttl)).await;
        // Issued a minute short of the TTL: still redeemable.
        store
            .insert_token(row("inside", now - ttl + Duration::minutes(1), ttl))
            .await;

        assert_matches!(
            issuer.redeem("at-boundary", TokenPurpose::Reset).await,
            Err(TokenError::Expired)
        );
        assert!(issuer.redeem("inside", TokenPurpose::Reset).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let (_store, issuer) = issuer();
        assert_matches!(
            issuer.redeem("nope", TokenPurpose::Reset).await,
            Err(TokenError::NotFound)
        );
        issuer.invalidate("nope").await.unwrap();
    }

    #[test]
    fn redemption_failures_collapse_to_token_invalid() {
        assert_matches!(CoreError::from(TokenError::NotFound), CoreError::TokenInvalid);
        assert_matches!(CoreError::from(TokenError::Expired), CoreError::TokenInvalid);
        assert_matches!(
            CoreError::from(TokenError::WrongPurpose {
                expected: TokenPurpose::Reset,
                actual: TokenPurpose::MagicLink,
            }),
            CoreError::TokenInvalid
        );
    }
}
