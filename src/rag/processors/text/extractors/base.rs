// Base trait for text extractors

use crate::rag::RAGResult;
use async_trait::async_trait;

/// Base trait for all text extractors
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Create a new extractor over the raw bytes of an uploaded file
    fn new(content: Vec<u8>) -> Self
    where
        Self: Sized;

    /// Extract the plain text content
    async fn extract_text(&self) -> RAGResult<String>;
}
