//! External identity provider bridge.
//!
//! A login attempt runs `begin` (authorization URL plus anti-CSRF state the
//! caller keeps in a short-lived cookie) and later `complete` with the state
//! and code the provider sent back. The verified email either links to an
//! existing user or provisions a new password-less one; both paths end in a
//! fresh session.

use std::sync::Arc;

use async_trait::async_trait;
use passgate_core::error::CoreError;
use passgate_db::models::session::Session;
use passgate_db::models::user::{CreateUser, User};
use passgate_db::repositories::UserRepository;
use passgate_db::StoreError;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::session::SessionManager;

/// Device descriptor recorded on sessions created through OAuth.
pub const OAUTH_DEVICE_INFO: &str = "Google OAuth";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_SCOPES: &str = "https://www.googleapis.com/auth/userinfo.email \
                             https://www.googleapis.com/auth/userinfo.profile";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Returned state missing or not the one issued. No exchange was attempted.
    #[error("Invalid OAuth request")]
    InvalidRequest,

    /// Any failure after the state check. The cause is for logs only.
    #[error("OAuth login failed: {0}")]
    OAuthFailed(String),
}

impl From<OAuthError> for CoreError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::InvalidRequest => CoreError::InvalidInput("invalid request".into()),
            OAuthError::OAuthFailed(cause) => CoreError::Upstream(cause),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider seam
// ---------------------------------------------------------------------------

/// Verified identity returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the user agent is sent to, carrying `state`.
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Trade an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Resolve an access token to a verified identity.
    async fn fetch_identity(&self, access_token: &str) -> Result<ExternalIdentity, ProviderError>;
}

/// OAuth client registration.
#[derive(Debug, Clone, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Google OAuth 2.0 over `reqwest`.
pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    email: String,
    #[serde(default)]
    verified_email: bool,
    #[serde(default)]
    name: String,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// Read a successful JSON body or turn the status and body text into an error.
async fn json_or_rejected<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];
        let response = self.http.post(GOOGLE_TOKEN_URL).form(&params).send().await?;
        let token: TokenResponse = json_or_rejected(response).await?;
        Ok(token.access_token)
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ExternalIdentity, ProviderError> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;
        let info: GoogleUserInfo = json_or_rejected(response).await?;

        if info.email.is_empty() {
            return Err(ProviderError::Malformed("userinfo has no email".into()));
        }
        if !info.verified_email {
            return Err(ProviderError::Malformed(format!(
                "email {} is not verified",
                info.email
            )));
        }
        Ok(ExternalIdentity {
            email: info.email,
            name: info.name,
        })
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// What the caller needs to start a login attempt.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    /// Anti-CSRF value to persist client-side until the callback.
    pub state: String,
    pub redirect_url: String,
}

/// Turns a provider callback into a session.
#[derive(Clone)]
pub struct OAuthBridge {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
    sessions: SessionManager,
}

impl OAuthBridge {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            provider,
            users,
            sessions,
        }
    }

    /// Generate a state value and the authorization URL embedding it.
    pub fn begin(&self) -> Result<OAuthStart, OAuthError> {
        let state = Uuid::new_v4().to_string();
        let redirect_url = self
            .provider
            .authorization_url(&state)
            .map_err(|e| OAuthError::OAuthFailed(e.to_string()))?;
        Ok(OAuthStart {
            state,
            redirect_url,
        })
    }

    /// Finish a login attempt.
    ///
    /// `issued_state` is the value handed out by [`OAuthBridge::begin`] (as
    /// read back from the client), `returned_state` the one the provider
    /// echoed. A mismatch fails closed before the code is touched.
    pub async fn complete(
        &self,
        issued_state: Option<&str>,
        returned_state: &str,
        code: &str,
    ) -> Result<Session, OAuthError> {
        match issued_state {
            Some(issued) if !issued.is_empty() && issued == returned_state => {}
            _ => return Err(OAuthError::InvalidRequest),
        }

        let access_token = self
            .provider
            .exchange_code(code)
            .await
            .map_err(|e| OAuthError::OAuthFailed(format!("code exchange failed: {e}")))?;
        let identity = self
            .provider
            .fetch_identity(&access_token)
            .await
            .map_err(|e| OAuthError::OAuthFailed(format!("identity lookup failed: {e}")))?;

        let user = self.link_or_provision(&identity).await?;
        self.sessions
            .create(user.id, OAUTH_DEVICE_INFO)
            .await
            .map_err(|e| OAuthError::OAuthFailed(e.to_string()))
    }

    async fn link_or_provision(&self, identity: &ExternalIdentity) -> Result<User, OAuthError> {
        let failed = |e: StoreError| OAuthError::OAuthFailed(e.to_string());

        if let Some(user) = self.users.find_by_email(&identity.email).await.map_err(failed)? {
            tracing::info!(user_id = %user.id, "OAuth identity linked to existing user");
            return Ok(user);
        }

        let input = CreateUser {
            email: identity.email.clone(),
            password_hash: None,
            name: identity.name.clone(),
        };
        match self.users.create(&input).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User provisioned from OAuth identity");
                Ok(user)
            }
            // Lost a race with a concurrent first login for the same email.
            Err(StoreError::UniqueViolation(_)) => self
                .users
                .find_by_email(&identity.email)
                .await
                .map_err(failed)?
                .ok_or_else(|| OAuthError::OAuthFailed("user vanished after conflict".into())),
            Err(e) => Err(failed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use passgate_db::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        identity: Result<ExternalIdentity, String>,
        exchanges: AtomicUsize,
    }

    impl ScriptedProvider {
        fn returning(email: &str, name: &str) -> Self {
            Self {
                identity: Ok(ExternalIdentity {
                    email: email.into(),
                    name: name.into(),
                }),
                exchanges: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                identity: Err("boom".into()),
                exchanges: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for ScriptedProvider {
        fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
            Ok(format!("https://idp.test/auth?state={state}"))
        }

        async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            Ok(format!("access-{code}"))
        }

        async fn fetch_identity(&self, _access_token: &str) -> Result<ExternalIdentity, ProviderError> {
            self.identity.clone().map_err(ProviderError::Malformed)
        }
    }

    fn bridge(provider: Arc<ScriptedProvider>) -> (Arc<MemoryStore>, OAuthBridge) {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionManager::new(store.clone());
        (store.clone(), OAuthBridge::new(provider, store, sessions))
    }

    #[test]
    fn google_authorization_url_carries_state_and_scopes() {
        let google = GoogleProvider::new(GoogleConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:8080/api/v1/oauth/google/callback".into(),
        });
        let url = google.authorization_url("abc-123").unwrap();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("state=abc-123"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("userinfo.email"));
        assert!(!url.contains("secret"));
    }

    #[test]
    fn begin_issues_fresh_state() {
        let (_store, bridge) = bridge(Arc::new(ScriptedProvider::returning("a@b.co", "A")));
        let first = bridge.begin().unwrap();
        let second = bridge.begin().unwrap();
        assert_ne!(first.state, second.state);
        assert!(first.redirect_url.ends_with(&first.state));
    }

    #[tokio::test]
    async fn mismatched_state_fails_closed_without_exchange() {
        let provider = Arc::new(ScriptedProvider::returning("a@b.co", "A"));
        let (_store, bridge) = bridge(provider.clone());

        assert_matches!(
            bridge.complete(Some("issued"), "forged", "code").await,
            Err(OAuthError::InvalidRequest)
        );
        assert_matches!(
            bridge.complete(None, "forged", "code").await,
            Err(OAuthError::InvalidRequest)
        );
        assert_matches!(
            bridge.complete(Some(""), "", "code").await,
            Err(OAuthError::InvalidRequest)
        );
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_login_provisions_passwordless_user() {
        let (store, bridge) = bridge(Arc::new(ScriptedProvider::returning("new@b.co", "Newbie")));

        let session = bridge.complete(Some("s"), "s", "code").await.unwrap();
        assert_eq!(session.device_info, OAUTH_DEVICE_INFO);

        let user = UserRepository::find_by_email(store.as_ref(), "new@b.co")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, session.user_id);
        assert_eq!(user.name, "Newbie");
        assert!(user.password_hash.is_none());
    }

    #[tokio::test]
    async fn existing_user_is_linked_not_duplicated() {
        let (store, bridge) = bridge(Arc::new(ScriptedProvider::returning("old@b.co", "Other")));
        let existing = UserRepository::create(
            store.as_ref(),
            &CreateUser {
                email: "old@b.co".into(),
                password_hash: Some("hash".into()),
                name: "Old".into(),
            },
        )
        .await
        .unwrap();

        let session = bridge.complete(Some("s"), "s", "code").await.unwrap();
        assert_eq!(session.user_id, existing.id);
    }

    #[tokio::test]
    async fn provider_failure_is_opaque() {
        let (_store, bridge) = bridge(Arc::new(ScriptedProvider::failing()));
        let err = bridge.complete(Some("s"), "s", "code").await.unwrap_err();
        assert_matches!(err, OAuthError::OAuthFailed(_));
        assert_matches!(CoreError::from(err), CoreError::Upstream(_));
    }
}
