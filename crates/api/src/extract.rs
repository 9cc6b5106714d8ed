//! Request extractors shared by handlers.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Message used when a body cannot be parsed at all.
pub const INVALID_REQUEST: &str = "invalid request";

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON and rule violations both reject with 400.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "Rejected JSON body");
            AppError::BadRequest(INVALID_REQUEST.into())
        })?;

        value
            .validate()
            .map_err(|errors| AppError::BadRequest(first_message(&errors)))?;
        Ok(ValidatedJson(value))
    }
}

/// Query string that has passed its `validator` rules.
///
/// A query string that does not deserialize (unknown shape, duplicate keys)
/// rejects with the same JSON body as a malformed request body.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "Rejected query string");
                AppError::BadRequest(INVALID_REQUEST.into())
            })?;

        value
            .validate()
            .map_err(|errors| AppError::BadRequest(first_message(&errors)))?;
        Ok(ValidatedQuery(value))
    }
}

/// The message of the first failing rule, by field name, so the response is
/// stable across runs.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .first()
        .and_then(|(_, errs)| errs.first())
        .and_then(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .unwrap_or_else(|| INVALID_REQUEST.to_string())
}
