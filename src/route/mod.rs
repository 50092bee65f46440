mod auth;
mod documents;

use crate::api;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

async fn health() -> &'static str {
    "OK"
}

pub fn create_rest_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes;

    // Protected routes requiring authentication
    let protected = Router::new()
        .merge(auth::protected_auth_routes())
        .merge(documents::document_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(auth::auth_routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
