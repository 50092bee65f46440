use crate::api;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
}

pub fn protected_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(api::auth::me))
        .route("/auth/change-password", post(api::auth::change_password))
        .route("/auth/account", delete(api::auth::delete_account))
}
