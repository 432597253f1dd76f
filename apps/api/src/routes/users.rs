use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{mint_token, AuthUser};
use crate::errors::AppError;
use crate::models::user::{self, NewUser, UserPatch};
use crate::state::AppState;

/// POST /users — admin only. Unlike /auth/register this may create admins,
/// and it returns a token for the new account alongside the user.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    auth.require_admin()?;
    let created = user::create(&state.db, body).await?;
    let token = mint_token(&created.username, created.is_admin, &state.config.jwt_secret)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": created, "token": token })),
    ))
}

/// GET /users — admin only.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    let users = user::find_all(&state.db).await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/:username — admin or the user themselves. Includes the ids of
/// the jobs the user has applied to.
pub async fn get(
    State(state): State<AppState>,
    Path(username): Path<String>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    auth.require_admin_or_self(&username)?;
    let found = user::get_with_jobs(&state.db, &username).await?;
    Ok(Json(json!({ "user": found })))
}

/// PATCH /users/:username — admin or self, sparse body. A body naming any
/// field outside the patchable set (isAdmin included) is a 400.
pub async fn update(
    State(state): State<AppState>,
    Path(username): Path<String>,
    auth: AuthUser,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin_or_self(&username)?;
    let Json(patch) =
        body.map_err(|_| AppError::Validation("Invalid user update fields".to_string()))?;
    let updated = user::update(&state.db, &username, patch).await?;
    Ok(Json(json!({ "user": updated })))
}

/// DELETE /users/:username — admin or self.
pub async fn remove(
    State(state): State<AppState>,
    Path(username): Path<String>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    auth.require_admin_or_self(&username)?;
    user::remove(&state.db, &username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id — admin or self. Applies the user to the
/// job; unknown user or job is a 404.
pub async fn apply(
    State(state): State<AppState>,
    Path((username, id)): Path<(String, i32)>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    auth.require_admin_or_self(&username)?;
    let applied = user::apply_to_job(&state.db, &username, id).await?;
    Ok(Json(json!({ "applied": applied })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordChange {
    pub password: String,
}

/// PATCH /users/:username/password — admin or self. A password failing the
/// account rules is a 400 with an `Invalid password:` message.
pub async fn set_password(
    State(state): State<AppState>,
    Path(username): Path<String>,
    auth: AuthUser,
    Json(body): Json<PasswordChange>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin_or_self(&username)?;
    user::update_password(&state.db, &username, &body.password).await?;
    Ok(Json(json!({
        "message": format!("Password updated successfully for {username}")
    })))
}
