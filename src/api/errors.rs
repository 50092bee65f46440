use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::AuthError;
use crate::database::UserError;
use crate::rag::RAGError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication errors (AUTH_xxx)
    AuthInvalidCredentials,
    AuthMissingToken,
    AuthTokenExpired,
    AuthInvalidToken,
    AuthTokenGenerationFailed,

    // Validation errors (VALID_xxx)
    ValidInvalidInput,
    ValidUnsupportedFileType,
    ValidEmptyDocument,
    ValidChunkingFailed,
    ValidPayloadTooLarge,

    // Resource errors (RESOURCE_xxx)
    ResourceNotFound,
    ResourceConflict,

    // System errors (SYSTEM_xxx)
    SystemDatabaseError,
    SystemVectorStoreError,
    SystemEmbeddingError,
    SystemFileProcessingError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Authentication
            ErrorCode::AuthInvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            ErrorCode::AuthMissingToken => "AUTH_MISSING_TOKEN",
            ErrorCode::AuthTokenExpired => "AUTH_TOKEN_EXPIRED",
            ErrorCode::AuthInvalidToken => "AUTH_INVALID_TOKEN",
            ErrorCode::AuthTokenGenerationFailed => "AUTH_TOKEN_GENERATION_FAILED",

            // Validation
            ErrorCode::ValidInvalidInput => "VALID_INVALID_INPUT",
            ErrorCode::ValidUnsupportedFileType => "VALID_UNSUPPORTED_FILE_TYPE",
            ErrorCode::ValidEmptyDocument => "VALID_EMPTY_DOCUMENT",
            ErrorCode::ValidChunkingFailed => "VALID_CHUNKING_FAILED",
            ErrorCode::ValidPayloadTooLarge => "VALID_PAYLOAD_TOO_LARGE",

            // Resource
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ResourceConflict => "RESOURCE_CONFLICT",

            // System
            ErrorCode::SystemDatabaseError => "SYSTEM_DATABASE_ERROR",
            ErrorCode::SystemVectorStoreError => "SYSTEM_VECTOR_STORE_ERROR",
            ErrorCode::SystemEmbeddingError => "SYSTEM_EMBEDDING_ERROR",
            ErrorCode::SystemFileProcessingError => "SYSTEM_FILE_PROCESSING_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ErrorCode::ValidInvalidInput
            | ErrorCode::ValidUnsupportedFileType
            | ErrorCode::ValidEmptyDocument
            | ErrorCode::ValidChunkingFailed => StatusCode::BAD_REQUEST,

            // 413 Payload Too Large
            ErrorCode::ValidPayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 401 Unauthorized
            ErrorCode::AuthInvalidCredentials
            | ErrorCode::AuthMissingToken
            | ErrorCode::AuthTokenExpired
            | ErrorCode::AuthInvalidToken => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            ErrorCode::ResourceConflict => StatusCode::CONFLICT,

            // 500 Internal Server Error
            ErrorCode::AuthTokenGenerationFailed
            | ErrorCode::SystemDatabaseError
            | ErrorCode::SystemVectorStoreError
            | ErrorCode::SystemEmbeddingError
            | ErrorCode::SystemFileProcessingError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct AppError {
    code: ErrorCode,
    message: String,
    details: Option<serde_json::Value>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // Convenience constructors for common errors
    pub fn missing_auth_header() -> Self {
        Self::new(
            ErrorCode::AuthMissingToken,
            "Missing or invalid authorization header",
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidInvalidInput, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        if status.is_server_error() {
            tracing::error!("{}: {}", self.code, self.message);
        }

        let body = Json(ApiError {
            error: self.message,
            error_code: self.code.as_str().to_string(),
            details: self.details,
        });

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<(StatusCode, T), AppError>;

// Conversion from domain error types
impl From<RAGError> for AppError {
    fn from(err: RAGError) -> Self {
        let code = match &err {
            RAGError::FileType(_) => ErrorCode::ValidUnsupportedFileType,
            RAGError::EmptyDocument(_) => ErrorCode::ValidEmptyDocument,
            RAGError::Chunking(_) => ErrorCode::ValidChunkingFailed,
            RAGError::InvalidInput(_) => ErrorCode::ValidInvalidInput,
            RAGError::NotFound(_) => ErrorCode::ResourceNotFound,
            RAGError::Embedding(_) => ErrorCode::SystemEmbeddingError,
            RAGError::FileProcessing(_) => ErrorCode::SystemFileProcessingError,
            RAGError::VectorCollection(_) | RAGError::Point(_) => ErrorCode::SystemVectorStoreError,
            RAGError::Repository(_) => ErrorCode::SystemDatabaseError,
        };
        Self::new(code, err.to_string())
            .with_details(serde_json::json!({ "kind": err.as_str() }))
    }
}

fn user_error_code(err: &UserError) -> ErrorCode {
    match err {
        UserError::UserExists(_) => ErrorCode::ResourceConflict,
        UserError::UserNotFound(_) => ErrorCode::ResourceNotFound,
        UserError::InvalidInput(_) => ErrorCode::ValidInvalidInput,
        UserError::Update(_) | UserError::Delete(_) | UserError::Repository(_) => {
            ErrorCode::SystemDatabaseError
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        Self::new(user_error_code(&err), err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::InvalidCredentials => ErrorCode::AuthInvalidCredentials,
            AuthError::TokenExpired => ErrorCode::AuthTokenExpired,
            AuthError::InvalidToken => ErrorCode::AuthInvalidToken,
            AuthError::TokenCreation(_) => ErrorCode::AuthTokenGenerationFailed,
            AuthError::User(user_err) => user_error_code(user_err),
        };
        Self::new(code, err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        let code = match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ErrorCode::ValidPayloadTooLarge,
            _ => ErrorCode::ValidInvalidInput,
        };
        Self::new(code, format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        Self::invalid_input(err.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        Self::invalid_input(err.body_text())
    }
}
