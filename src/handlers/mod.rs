// Route handlers. Each returns `Result<_, ApiError>` so domain errors map to
// status codes in one place (see `error.rs`).
pub mod companies;
pub mod jobs;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::database::models::FieldErrors;
use crate::error::ApiError;

/// Decode a JSON body into `T`, turning both malformed JSON and shape
/// mismatches into 400s
pub(crate) fn parse_body<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, ApiError> {
    let Json(value) = body.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
    serde_json::from_value(value).map_err(|e| ApiError::validation_error(e.to_string(), None))
}

pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

pub(crate) fn parse_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(p)| p)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

pub(crate) fn invalid(message: &'static str) -> impl FnOnce(FieldErrors) -> ApiError {
    move |errors| ApiError::validation_error(message, Some(errors))
}
