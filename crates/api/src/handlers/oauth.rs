//! Handlers for Google OAuth login.

use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use passgate_core::error::CoreError;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::oauth::OAuthError;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedQuery;
use crate::response::{ApiResponse, TokenData};
use crate::state::AppState;

/// Cookie carrying the anti-CSRF state between redirect and callback.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the state cookie in seconds.
const OAUTH_STATE_MAX_AGE: u32 = 600;

#[derive(Debug, Serialize)]
pub struct RedirectData {
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CallbackQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}

fn state_cookie(value: &str, max_age: u32, secure: bool) -> String {
    let mut cookie =
        format!("{OAUTH_STATE_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name` from the request's `Cookie` headers.
fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// GET /api/v1/oauth/google
///
/// Returns the provider URL and sets the state cookie the callback checks.
pub async fn google_login(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let start = state.oauth.begin().map_err(CoreError::from)?;
    let secure = state.config.base_url.starts_with("https://");

    Ok((
        [(SET_COOKIE, state_cookie(&start.state, OAUTH_STATE_MAX_AGE, secure))],
        Json(ApiResponse::data(RedirectData {
            redirect_url: start.redirect_url,
        })),
    ))
}

/// GET /api/v1/oauth/google/callback?state=...&code=...
///
/// A state mismatch is rejected before anything else happens and leaves the
/// cookie alone. Past that point the cookie is always cleared.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedQuery(query): ValidatedQuery<CallbackQuery>,
) -> Response {
    let issued = read_cookie(&headers, OAUTH_STATE_COOKIE);
    let outcome = state
        .oauth
        .complete(issued.as_deref(), &query.state, &query.code)
        .await;

    let response = match outcome {
        Ok(session) => Json(ApiResponse::with_message(
            "login successful",
            TokenData {
                token: session.session_token,
            },
        ))
        .into_response(),
        Err(OAuthError::InvalidRequest) => {
            tracing::warn!("OAuth callback state mismatch");
            return AppError::from(CoreError::from(OAuthError::InvalidRequest)).into_response();
        }
        Err(e) => AppError::from(CoreError::from(e)).into_response(),
    };

    let secure = state.config.base_url.starts_with("https://");
    ([(SET_COOKIE, state_cookie("", 0, secure))], response).into_response()
}
