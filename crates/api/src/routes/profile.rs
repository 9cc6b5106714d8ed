use axum::routing::{get, post};
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// Routes requiring a bearer session.
///
/// ```text
/// GET  /profile              -> profile
/// GET  /logout               -> logout
/// POST /invalidate-sessions  -> invalidate_sessions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::profile))
        .route("/logout", get(profile::logout))
        .route("/invalidate-sessions", post(profile::invalidate_sessions))
}
