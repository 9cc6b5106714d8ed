//! Route definitions for the `/oauth` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::oauth;
use crate::state::AppState;

/// Routes mounted at `/oauth`.
///
/// ```text
/// GET /google           -> google_login
/// GET /google/callback  -> google_callback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google", get(oauth::google_login))
        .route("/google/callback", get(oauth::google_callback))
}
