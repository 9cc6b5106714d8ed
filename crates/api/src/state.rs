use std::sync::Arc;

use passgate_db::Repositories;

use crate::auth::oauth::{IdentityProvider, OAuthBridge};
use crate::auth::purpose_token::TokenIssuer;
use crate::auth::service::AuthService;
use crate::auth::session::SessionManager;
use crate::config::ServerConfig;
use crate::email::Mailer;
use crate::middleware::rate_limit::IpRateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub auth: AuthService,
    pub oauth: OAuthBridge,
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// Wire every component from its collaborators. The only place services
    /// are constructed; the binary and the integration tests both go through it.
    pub fn assemble(
        config: ServerConfig,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let sessions = SessionManager::new(repos.sessions.clone());
        let tokens = TokenIssuer::new(repos.tokens.clone());
        let auth = AuthService::new(
            repos.users.clone(),
            sessions.clone(),
            tokens,
            mailer,
            config.base_url.clone(),
        );
        let oauth = OAuthBridge::new(identity_provider, repos.users, sessions);
        let rate_limiter = Arc::new(IpRateLimiter::new(config.rate_limit));

        Self {
            config: Arc::new(config),
            auth,
            oauth,
            rate_limiter,
        }
    }
}
