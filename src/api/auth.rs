use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiResult;
use crate::api::middleware::AuthenticatedUser;
use crate::database::models::{
    PasswordChangeRequest, TokenResponse, UserCreate, UserLogin, UserResponse,
};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Register a new account
#[debug_handler]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(request) = payload?;
    let user = state.auth.register(&request.email, &request.password).await?;
    Ok((StatusCode::OK, Json(user)))
}

/// Exchange email and password for a bearer token
#[debug_handler]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(request) = payload?;
    let token = state.auth.login(&request.email, &request.password).await?;
    Ok((StatusCode::OK, Json(token)))
}

/// Get current user
#[debug_handler]
pub async fn me(Extension(auth_user): Extension<AuthenticatedUser>) -> ApiResult<Json<UserResponse>> {
    Ok((StatusCode::OK, Json(auth_user.user.user)))
}

#[debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    payload: Result<Json<PasswordChangeRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(request) = payload?;
    let user = state
        .auth
        .users()
        .change_password(
            &auth_user.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok((StatusCode::OK, Json(user)))
}

/// Tokens are stateless; clients discard theirs
#[debug_handler]
pub async fn logout() -> ApiResult<Json<MessageResponse>> {
    Ok((StatusCode::OK, Json(MessageResponse::new("Logged out successfully"))))
}

/// Delete the current account together with all of its documents
#[debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .documents
        .delete_all_user_documents(&auth_user.user_id)
        .await?;
    state.auth.users().delete_user(&auth_user.user_id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Account deleted successfully"))))
}
