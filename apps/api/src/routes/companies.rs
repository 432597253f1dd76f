use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::company::{self, CompanyPatch, NewCompany};
use crate::sql::CompanyFilters;
use crate::state::AppState;

/// GET /companies
/// Anonymous. Optional name / minEmployees / maxEmployees filters; an
/// unrecognized filter key is a 400 before any query building happens.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<CompanyFilters>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(filters) =
        query.map_err(|_| AppError::Validation("Invalid company filter fields".to_string()))?;
    let companies = company::find_all(&state.db, &filters).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// GET /companies/:handle
pub async fn get(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, AppError> {
    let found = company::get(&state.db, &handle).await?;
    Ok(Json(json!({ "company": found })))
}

/// POST /companies — admin only.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewCompany>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    auth.require_admin()?;
    let created = company::create(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": created }))))
}

/// PATCH /companies/:handle — admin only, sparse body.
pub async fn update(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    auth: AuthUser,
    Json(body): Json<CompanyPatch>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    let updated = company::update(&state.db, &handle, body).await?;
    Ok(Json(json!({ "company": updated })))
}

/// DELETE /companies/:handle — admin only.
pub async fn remove(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    company::remove(&state.db, &handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
