//! Auth orchestrator.
//!
//! Composes the hasher, purpose-token issuer, session manager and mailer into
//! the user-facing flows. Holds no state of its own. Every failure leaves here
//! as a [`CoreError`] kind carrying no detail a client could use to tell an
//! unknown email from a wrong password.

use std::sync::Arc;

use passgate_core::error::CoreError;
use passgate_core::types::UserId;
use passgate_db::models::session::Session;
use passgate_db::models::token::TokenPurpose;
use passgate_db::models::user::{CreateUser, User};
use passgate_db::repositories::UserRepository;
use passgate_db::StoreError;

use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::auth::purpose_token::TokenIssuer;
use crate::auth::session::SessionManager;
use crate::email::{magic_link_email, password_reset_email, Mailer};

fn store_failure(err: StoreError) -> CoreError {
    CoreError::Internal(err.to_string())
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: SessionManager,
    tokens: TokenIssuer,
    mailer: Arc<dyn Mailer>,
    /// Public base URL emailed links point at.
    base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: SessionManager,
        tokens: TokenIssuer,
        mailer: Arc<dyn Mailer>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            mailer,
            base_url: base_url.into(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Create an account and log it straight in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        device_info: &str,
    ) -> Result<Session, CoreError> {
        if self
            .users
            .find_by_email(email)
            .await
            .map_err(store_failure)?
            .is_some()
        {
            return Err(CoreError::Conflict("email already exists".into()));
        }

        let password_hash =
            hash_password(password).map_err(|e| CoreError::Internal(e.to_string()))?;
        let input = CreateUser {
            email: email.to_string(),
            password_hash: Some(password_hash),
            name: name.trim().to_string(),
        };
        let user = match self.users.create(&input).await {
            Ok(user) => user,
            Err(StoreError::UniqueViolation(_)) => {
                return Err(CoreError::Conflict("email already exists".into()))
            }
            Err(e) => return Err(store_failure(e)),
        };
        tracing::info!(user_id = %user.id, "User registered");

        Ok(self.sessions.create(user.id, device_info).await?)
    }

    /// Password login. Unknown email, password-less account and wrong password
    /// are indistinguishable, in result and in cost.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device_info: &str,
    ) -> Result<Session, CoreError> {
        let user = self.users.find_by_email(email).await.map_err(store_failure)?;

        let verified = match user.as_ref().and_then(|u| u.password_hash.as_deref()) {
            Some(hash) => verify_password(hash, password),
            None => {
                verify_against_dummy(password);
                false
            }
        };

        match user {
            Some(user) if verified => Ok(self.sessions.create(user.id, device_info).await?),
            _ => {
                tracing::debug!("Login rejected");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    /// Email a password reset link if `email` belongs to a user.
    ///
    /// Never fails from the caller's point of view; the response must not
    /// reveal whether the address is registered.
    pub async fn request_password_reset(&self, email: &str) {
        self.send_purpose_link(email, TokenPurpose::Reset).await;
    }

    /// Email a magic login link if `email` belongs to a user. Same contract as
    /// [`AuthService::request_password_reset`].
    pub async fn request_magic_link(&self, email: &str) {
        self.send_purpose_link(email, TokenPurpose::MagicLink).await;
    }

    async fn send_purpose_link(&self, email: &str, purpose: TokenPurpose) {
        let user = match self.users.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(%purpose, "Link requested for unknown email");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, %purpose, "User lookup failed");
                return;
            }
        };

        let token = match self.tokens.issue(&user.id.to_string(), purpose).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, %purpose, "Token issuance failed");
                return;
            }
        };

        let (subject, body) = match purpose {
            TokenPurpose::Reset => password_reset_email(&self.base_url, &token),
            TokenPurpose::MagicLink => magic_link_email(&self.base_url, &token),
        };
        if let Err(e) = self.mailer.send(&user.email, &subject, &body).await {
            tracing::error!(error = %e, user_id = %user.id, %purpose, "Failed to send email");
        }
    }

    /// Redeem a reset token and replace the password.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), CoreError> {
        let record = self.tokens.redeem(token, TokenPurpose::Reset).await?;
        let user_id = parse_owner(&record.user_id)?;

        let password_hash =
            hash_password(new_password).map_err(|e| CoreError::Internal(e.to_string()))?;
        if !self
            .users
            .update_password(user_id, &password_hash)
            .await
            .map_err(store_failure)?
        {
            tracing::warn!(user_id = %user_id, "Reset token owner no longer exists");
            return Err(CoreError::TokenInvalid);
        }
        tracing::info!(user_id = %user_id, "Password reset");

        self.invalidate_best_effort(token).await;
        Ok(())
    }

    /// Redeem a magic-link token for a new session.
    pub async fn verify_magic_link(
        &self,
        token: &str,
        device_info: &str,
    ) -> Result<Session, CoreError> {
        let record = self.tokens.redeem(token, TokenPurpose::MagicLink).await?;
        let user_id = parse_owner(&record.user_id)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(store_failure)?
            .ok_or(CoreError::TokenInvalid)?;
        let session = self.sessions.create(user.id, device_info).await?;

        self.invalidate_best_effort(token).await;
        Ok(session)
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, session_token: &str) -> Result<User, CoreError> {
        let session = self.sessions.validate(session_token).await?;
        self.users
            .find_by_id(session.user_id)
            .await
            .map_err(store_failure)?
            .ok_or(CoreError::Unauthorized)
    }

    /// Revoke the session holding `session_token`.
    pub async fn logout(&self, session_token: &str) -> Result<(), CoreError> {
        Ok(self.sessions.revoke(session_token).await?)
    }

    /// Revoke every session of `user_id`.
    pub async fn logout_everywhere(&self, user_id: UserId) -> Result<u64, CoreError> {
        Ok(self.sessions.revoke_all_for_user(user_id).await?)
    }

    /// The dependent action has already committed, so a failure here only
    /// widens the reuse window.
    async fn invalidate_best_effort(&self, token: &str) {
        if let Err(e) = self.tokens.invalidate(token).await {
            tracing::warn!(error = %e, "Failed to invalidate redeemed token");
        }
    }
}

/// Token owners are stored as opaque strings. One that is not a user id
/// cannot authorize anything.
fn parse_owner(owner: &str) -> Result<UserId, CoreError> {
    owner.parse().map_err(|_| {
        tracing::warn!(owner, "Purpose token owner is not a user id");
        CoreError::TokenInvalid
    })
}
