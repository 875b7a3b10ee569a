use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use super::parse_path;
use crate::api::AppState;
use crate::error::ApiError;

/// GET /companies => { companies: [ { handle, name, description, numEmployees, logoUrl }, ... ] }
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let companies = state.companies.list_companies().await?;
    Ok(Json(json!({ "companies": companies })))
}

/// GET /companies/:handle => { company } including its `jobs`
pub async fn get(
    State(state): State<AppState>,
    handle: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let handle = parse_path(handle)?;
    let company = state.companies.get_company(&handle).await?;
    Ok(Json(json!({ "company": company })))
}
