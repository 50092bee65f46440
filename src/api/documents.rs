use axum::{
    debug_handler,
    extract::{rejection::QueryRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;

use crate::api::errors::{ApiResult, AppError};
use crate::api::middleware::AuthenticatedUser;
use crate::rag::{DeleteResponse, DocumentResponse, DocumentUploadResponse, SearchResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub top_k: Option<usize>,
}

/// Upload a document and index it for the current user
#[debug_handler]
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> ApiResult<Json<DocumentUploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content = field.bytes().await?;
        tracing::debug!(
            "Received upload {:?} ({} bytes) from {}",
            filename,
            content.len(),
            auth_user.user_id
        );

        let response = state
            .documents
            .upload_document(filename.as_deref(), content.to_vec(), &auth_user.user_id)
            .await?;
        return Ok((StatusCode::OK, Json(response)));
    }

    Err(AppError::invalid_input("No file provided"))
}

#[debug_handler]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    let documents = state
        .documents
        .list_user_documents(&auth_user.user_id)
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(documents)))
}

#[debug_handler]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(doc_id): Path<String>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state
        .documents
        .get_user_document(&doc_id, &auth_user.user_id)
        .await?;
    Ok((StatusCode::OK, Json(DocumentResponse::from(document.metadata))))
}

#[debug_handler]
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(doc_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let response = state
        .documents
        .delete_user_document(&doc_id, &auth_user.user_id)
        .await?;
    Ok((StatusCode::OK, Json(response)))
}

/// Semantic search over the current user's documents
#[debug_handler]
pub async fn search_documents(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let Query(params) = params?;
    let results = state
        .documents
        .search_user_documents(&params.query, params.top_k, &auth_user.user_id)
        .await?;
    Ok((StatusCode::OK, Json(results)))
}
