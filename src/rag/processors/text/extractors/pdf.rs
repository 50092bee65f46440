// PDF text extractor

use super::base::TextExtractor;
use crate::rag::{RAGError, RAGResult};
use async_trait::async_trait;

pub struct PdfExtractor {
    content: Vec<u8>,
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    async fn extract_text(&self) -> RAGResult<String> {
        // pdf-extract is synchronous and CPU bound
        let pdf_bytes = self.content.clone();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf_bytes))
            .await
            .map_err(|e| RAGError::FileProcessing(format!("Task join error: {}", e)))?
            .map_err(|e| {
                tracing::error!("PDF extraction failed: {}", e);
                RAGError::FileProcessing(format!("Failed to extract text from PDF: {}", e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVENUE_PDF: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/revenue.pdf"));

    #[tokio::test]
    async fn test_text_is_extracted_from_pdf() {
        let text = PdfExtractor::new(REVENUE_PDF.to_vec())
            .extract_text()
            .await
            .unwrap();
        assert!(text.contains("Quarterly revenue grew steadily"), "{:?}", text);
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_a_processing_error() {
        let extractor = PdfExtractor::new(b"definitely not a pdf".to_vec());
        let err = extractor.extract_text().await.unwrap_err();
        assert!(matches!(err, RAGError::FileProcessing(_)));
    }
}
