// RAG (Retrieval-Augmented Generation) module
// Document ingestion, vector storage and semantic search

pub mod engines;
pub mod models;
pub mod processors;
pub mod service;
pub mod services;

pub use engines::VectorStore;
pub use models::*;
pub use service::DocumentService;
pub use services::EmbeddingService;

/// Errors raised by the ingestion and retrieval pipeline
#[derive(Debug, thiserror::Error)]
pub enum RAGError {
    #[error("{0}")]
    FileType(String),
    #[error("{0}")]
    EmptyDocument(String),
    #[error("{0}")]
    Chunking(String),
    #[error("{0}")]
    Embedding(String),
    #[error("{0}")]
    FileProcessing(String),
    #[error("Vector storage error: {0}")]
    VectorCollection(String),
    #[error("Vector point error: {0}")]
    Point(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Repository(String),
}

impl RAGError {
    pub fn as_str(&self) -> &'static str {
        match self {
            RAGError::FileType(_) => "unsupported_file_format",
            RAGError::EmptyDocument(_) => "empty_document",
            RAGError::Chunking(_) => "chunking_failed",
            RAGError::Embedding(_) => "embedding_generation_failed",
            RAGError::FileProcessing(_) => "text_extraction_failed",
            RAGError::VectorCollection(_) => "vector_collection_error",
            RAGError::Point(_) => "vector_point_error",
            RAGError::NotFound(_) => "document_not_found",
            RAGError::InvalidInput(_) => "invalid_input",
            RAGError::Repository(_) => "repository_error",
        }
    }
}

pub type RAGResult<T> = Result<T, RAGError>;
