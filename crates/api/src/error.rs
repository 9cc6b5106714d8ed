use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use passgate_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{"error": "<message>"}` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `passgate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed body or failed field validation.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The client IP exhausted its token bucket.
    #[error("Rate limited")]
    RateLimited,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "internal server error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "invalid email or password".to_string(),
                ),
                CoreError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
                CoreError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::TokenInvalid => (StatusCode::BAD_REQUEST, "invalid token".to_string()),
                CoreError::Upstream(cause) => {
                    tracing::error!(error = %cause, "Upstream failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
                CoreError::Internal(cause) => {
                    tracing::error!(error = %cause, "Internal core error");
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, "too many requests".to_string())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
