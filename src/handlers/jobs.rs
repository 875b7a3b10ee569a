use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{invalid, parse_body, parse_path, parse_query};
use crate::api::AppState;
use crate::database::models::{JobFilter, JobUpdate, NewJob};
use crate::error::ApiError;

/// POST /jobs { title, salary?, equity?, companyHandle } => { job }
///
/// Authorization required: admin
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new_job: NewJob = parse_body(body)?;
    new_job.validate().map_err(invalid("Invalid job data"))?;

    let job = state.jobs.create(new_job).await?;
    tracing::info!("Created job {} ({}) for {}", job.id, job.title, job.company_handle);

    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// GET /jobs?title&minSalary&hasEquity => { jobs: [ { id, title, salary, equity, companyHandle }, ... ] }
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<JobFilter>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let filter = parse_query(query)?;
    filter.validate().map_err(invalid("Invalid search filter"))?;

    let jobs = state.jobs.find_all(&filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /jobs/:id => { job } with `company` nested
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_path(id)?;
    let job = state.jobs.get(id).await?;
    Ok(Json(json!({ "job": job })))
}

/// PATCH /jobs/:id { title?, salary?, equity? } => { job }
///
/// Authorization required: admin
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_path(id)?;
    let changes: JobUpdate = parse_body(body)?;
    changes.validate().map_err(invalid("Invalid job data"))?;

    let job = state.jobs.update(id, changes).await?;
    tracing::info!("Updated job {}", job.id);

    Ok(Json(json!({ "job": job })))
}

/// DELETE /jobs/:id => { deleted: id }
///
/// Authorization required: admin
pub async fn remove(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_path(id)?;
    state.jobs.remove(id).await?;
    tracing::info!("Deleted job {}", id);

    Ok(Json(json!({ "deleted": id })))
}
