use crate::api;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/documents", get(api::documents::list_documents))
        .route("/api/documents/upload", post(api::documents::upload_document))
        .route("/api/documents/search", post(api::documents::search_documents))
        .route(
            "/api/documents/{id}",
            get(api::documents::get_document).delete(api::documents::delete_document),
        )
}
