pub mod auth;
pub mod health;
pub mod oauth;
pub mod profile;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /register                    POST  create account + session (public)
/// /login                       POST  password login (public)
/// /forgot-password             POST  email reset link (public)
/// /magic-link-login            POST  email magic link (public)
/// /verify-magic-link?token=    GET   magic link -> session (public)
/// /reset-password              POST  reset token + new password (public)
///
/// /oauth/google                GET   provider URL + state cookie (public)
/// /oauth/google/callback       GET   state + code -> session (public)
///
/// /profile                     GET   current user (requires auth)
/// /logout                      GET   revoke this session (requires auth)
/// /invalidate-sessions         POST  revoke all sessions (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/oauth", oauth::router())
        .merge(profile::router())
}
