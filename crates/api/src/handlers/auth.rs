//! Handlers for registration, password login, reset and magic links.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use passgate_core::validation::{validate_name, validate_password};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::handlers::device_info;
use crate::response::{ApiResponse, TokenData};
use crate::state::AppState;

const RESET_REQUESTED: &str = "if the email exists, a password reset link will be sent";
const MAGIC_LINK_REQUESTED: &str = "if the email exists, a magic link will be sent";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(custom(function = "validate_name"))]
    pub name: String,
}

/// Request body for `POST /login`.
///
/// Password strength is not checked here; a weak guess must fail the same way
/// as any other wrong password.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Request body for `POST /forgot-password` and `POST /magic-link-login`.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
}

/// Request body for `POST /reset-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Query of `GET /verify-magic-link`.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenQuery {
    #[serde(default)]
    #[validate(length(min = 1, message = "invalid request"))]
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<TokenData>>> {
    let session = state
        .auth
        .register(
            &input.email,
            &input.password,
            &input.name,
            device_info(&headers),
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        "registration successful",
        TokenData {
            token: session.session_token,
        },
    )))
}

/// POST /api/v1/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenData>>> {
    let session = state
        .auth
        .login(&input.email, &input.password, device_info(&headers))
        .await?;

    Ok(Json(ApiResponse::with_message(
        "login successful",
        TokenData {
            token: session.session_token,
        },
    )))
}

/// POST /api/v1/forgot-password
///
/// Same answer whether or not the email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<EmailRequest>,
) -> Json<ApiResponse<()>> {
    state.auth.request_password_reset(&input.email).await;
    Json(ApiResponse::message(RESET_REQUESTED))
}

/// POST /api/v1/magic-link-login
///
/// Same answer whether or not the email is registered.
pub async fn magic_link_login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<EmailRequest>,
) -> Json<ApiResponse<()>> {
    state.auth.request_magic_link(&input.email).await;
    Json(ApiResponse::message(MAGIC_LINK_REQUESTED))
}

/// GET /api/v1/verify-magic-link?token=...
pub async fn verify_magic_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedQuery(query): ValidatedQuery<TokenQuery>,
) -> AppResult<Json<ApiResponse<TokenData>>> {
    let session = state
        .auth
        .verify_magic_link(&query.token, device_info(&headers))
        .await?;

    Ok(Json(ApiResponse::with_message(
        "login successful",
        TokenData {
            token: session.session_token,
        },
    )))
}

/// POST /api/v1/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .auth
        .reset_password(&input.token, &input.password)
        .await?;
    Ok(Json(ApiResponse::message("password updated successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rules() {
        let ok = RegisterRequest {
            email: "alice@example.com".into(),
            password: "Str0ng!Pass".into(),
            name: "Alice".into(),
        };
        assert!(ok.validate().is_ok());

        let weak = RegisterRequest {
            password: "weakpass".into(),
            ..ok
        };
        let errors = weak.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn register_rejects_blank_name_and_bad_email() {
        let bad = RegisterRequest {
            email: "not-an-email".into(),
            password: "Str0ng!Pass".into(),
            name: "   ".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn login_does_not_check_strength() {
        let req = LoginRequest {
            email: "alice@example.com".into(),
            password: "x".into(),
        };
        assert!(req.validate().is_ok());

        let empty = LoginRequest {
            email: "alice@example.com".into(),
            password: String::new(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn reset_requires_token_and_strong_password() {
        let req = ResetPasswordRequest {
            token: String::new(),
            password: "short".into(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("token"));
        assert!(fields.contains_key("password"));
    }
}
