//! Handlers for the authenticated user.

use axum::extract::State;
use axum::Json;
use passgate_db::models::user::UserResponse;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn profile(auth: AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::data(UserResponse::from(auth.user)))
}

/// GET /api/v1/logout
///
/// Revokes only the session presented.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth.logout(&auth.session_token).await?;
    Ok(Json(ApiResponse::message("logged out successfully")))
}

/// POST /api/v1/invalidate-sessions
///
/// Revokes every session of the caller, including the one presented.
pub async fn invalidate_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<()>>> {
    let revoked = state.auth.logout_everywhere(auth.user.id).await?;
    tracing::info!(user_id = %auth.user.id, revoked, "Sessions invalidated on request");
    Ok(Json(ApiResponse::message("all sessions invalidated")))
}
