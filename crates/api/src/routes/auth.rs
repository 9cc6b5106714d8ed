//! Route definitions for the public authentication endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// ```text
/// POST /register           -> register
/// POST /login              -> login
/// POST /forgot-password    -> forgot_password
/// POST /magic-link-login   -> magic_link_login
/// GET  /verify-magic-link  -> verify_magic_link
/// POST /reset-password     -> reset_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/magic-link-login", post(auth::magic_link_login))
        .route("/verify-magic-link", get(auth::verify_magic_link))
        .route("/reset-password", post(auth::reset_password))
}
