//! Bearer-session authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use passgate_core::error::CoreError;
use passgate_db::models::user::User;

use crate::error::AppError;
use crate::state::AppState;

/// The user owning the session presented in `Authorization: Bearer <token>`.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %auth.user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Missing header, wrong scheme, unknown, revoked and expired sessions all
/// reject with the same 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// The bearer token itself, needed to revoke this session.
    pub session_token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Core(CoreError::Unauthorized))?;

        let user = state.auth.authenticate(token).await?;

        Ok(AuthUser {
            user,
            session_token: token.to_string(),
        })
    }
}
