use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::job::{self, JobPatch, NewJob};
use crate::sql::JobFilters;
use crate::state::AppState;

/// GET /jobs
/// Anonymous. Optional title / minSalary / hasEquity filters.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<JobFilters>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(filters) =
        query.map_err(|_| AppError::Validation("Invalid job filter fields".to_string()))?;
    let jobs = job::find_all(&state.db, &filters).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /jobs/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let found = job::get(&state.db, id).await?;
    Ok(Json(json!({ "job": found })))
}

/// POST /jobs — admin only.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewJob>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    auth.require_admin()?;
    let created = job::create(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": created }))))
}

/// PATCH /jobs/:id — admin only, sparse body.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth: AuthUser,
    Json(body): Json<JobPatch>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    let updated = job::update(&state.db, id, body).await?;
    Ok(Json(json!({ "job": updated })))
}

/// DELETE /jobs/:id — admin only.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    job::remove(&state.db, id).await?;
    Ok(Json(json!({ "deleted": id })))
}
