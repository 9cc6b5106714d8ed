//! Shared response envelope for API handlers.
//!
//! Successful responses use `{ "message"?: ..., "data"?: ... }`; absent parts
//! are omitted. Errors use [`crate::error::AppError`] instead.

use serde::Serialize;

/// Standard success envelope.
///
/// ```ignore
/// Ok(Json(ApiResponse::with_message("login successful", TokenData { token })))
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: &'static str, data: T) -> Self {
        Self {
            message: Some(message),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &'static str) -> Self {
        Self {
            message: Some(message),
            data: None,
        }
    }
}

/// `data` payload of every endpoint that hands out a session.
#[derive(Debug, Serialize)]
pub struct TokenData {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_parts_are_omitted() {
        let only_message = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(only_message, json!({ "message": "done" }));

        let only_data = serde_json::to_value(ApiResponse::data(TokenData {
            token: "t".into(),
        }))
        .unwrap();
        assert_eq!(only_data, json!({ "data": { "token": "t" } }));
    }
}
