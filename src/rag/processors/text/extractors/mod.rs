// Text extraction for uploaded documents

pub mod base;
pub mod docx;
pub mod pdf;
pub mod plain_text;

use crate::rag::{RAGError, RAGResult};
pub use base::TextExtractor;
use std::path::Path;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use plain_text::PlainTextExtractor;

/// File extensions accepted for upload, lowercased and dot-prefixed
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".txt", ".pdf", ".docx"];

/// Lowercased extension of `filename` including the leading dot, or an empty
/// string when there is none (dotfiles such as `.env` have no extension).
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Main entry point: extract plain text from an uploaded file based on its extension
pub async fn load_document(filename: &str, content: Vec<u8>) -> RAGResult<String> {
    let ext = file_extension(filename);
    tracing::debug!("Extracting text from {} ({} bytes)", filename, content.len());

    match ext.as_str() {
        ".txt" => PlainTextExtractor::new(content).extract_text().await,
        ".pdf" => PdfExtractor::new(content).extract_text().await,
        ".docx" => DocxExtractor::new(content).extract_text().await,
        _ => Err(RAGError::FileType(format!("Unsupported file type: {}", ext))),
    }
}
