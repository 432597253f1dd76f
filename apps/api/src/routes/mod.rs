pub mod auth;
pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/token", post(auth::post_token))
        .route("/auth/register", post(auth::post_register))
        // Companies: reads are anonymous, mutations admin-only
        .route("/companies", get(companies::list).post(companies::create))
        .route(
            "/companies/:handle",
            get(companies::get)
                .patch(companies::update)
                .delete(companies::remove),
        )
        // Jobs: same access shape as companies
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route(
            "/jobs/:id",
            get(jobs::get).patch(jobs::update).delete(jobs::remove),
        )
        // Users: admin-only listing/creation, admin-or-self for the rest
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route("/users/:username/password", patch(users::set_password))
        .route("/users/:username/jobs/:id", post(users::apply))
        .with_state(state)
}
