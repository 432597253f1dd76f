use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::mint_token;
use crate::errors::AppError;
use crate::models::user::{self, NewUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/token
/// Credentials in, bearer token out.
pub async fn post_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<Value>, AppError> {
    let user = user::authenticate(&state.db, &req.username, &req.password).await?;
    let token = mint_token(&user.username, user.is_admin, &state.config.jwt_secret)?;
    Ok(Json(json!({ "token": token })))
}

/// Self-registration body. Deliberately has no isAdmin field; admins are
/// only minted through POST /users by another admin.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// POST /auth/register
pub async fn post_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = user::create(
        &state.db,
        NewUser {
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            is_admin: false,
        },
    )
    .await?;

    let token = mint_token(&user.username, user.is_admin, &state.config.jwt_secret)?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
