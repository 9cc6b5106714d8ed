//! HTTP handlers. Each one translates a request into an [`crate::auth`] call
//! and the result into the response envelope.

pub mod auth;
pub mod oauth;
pub mod profile;

use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;

/// Device descriptor recorded on new sessions: the `User-Agent`, or empty.
pub(crate) fn device_info(headers: &HeaderMap) -> &str {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
